//! Periodic metric samplers.
//!
//! Each sampler is independent: it owns its inputs, publishes one immutable
//! snapshot per tick, and recovers locally from failed reads by keeping its
//! last-known-good value. There is no shared state between samplers.

use std::time::Duration;

mod cpu;
mod frame;
mod memory;

pub use cpu::{
    BusyTickSource, CpuSampler, CpuTimePoint, DEFAULT_SPIN_ITERATIONS, ProcessCpuTime,
    SpinWorkload, percent_busy,
};
pub use frame::{FPS_WINDOW_MS, FrameRateCounter};
pub use memory::MemorySampler;

/// Reference sampling cadence for the memory and CPU pollers.
pub const DEFAULT_SAMPLE_PERIOD: Duration = Duration::from_millis(500);
