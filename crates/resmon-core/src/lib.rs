//! # resmon-core
//!
//! Sampling core for a live resource monitor: RAM usage, a process-CPU busy
//! approximation, and a render frame rate, each driven by its own periodic
//! timer.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::time::Duration;
//! use resmon_core::{CpuSampler, MemorySampler, Poller};
//!
//! let mut memory = MemorySampler::new();
//! let mut cpu = CpuSampler::new();
//!
//! let poller = Poller::spawn("sampler", Duration::from_millis(500), move || {
//!     if let Ok(mem) = memory.sample() {
//!         println!("ram {mem}");
//!     }
//!     println!("cpu {}", cpu.sample());
//! })
//! .unwrap();
//!
//! // ... the poller ticks until it is stopped or dropped.
//! poller.stop();
//! ```
//!
//! ## Architecture
//!
//! Samplers → Snapshots → Display layer
//!
//! Each sampler is independent and publishes an immutable snapshot per tick.
//! Failed reads are recovered locally: the sampler keeps its last-known-good
//! snapshot, logs the failure, and retries on the next tick — a single bad
//! sample never terminates a polling loop.
//!
//! The CPU reading is deliberately a *self-process* approximation: it holds a
//! measurement window open with a fixed spin workload and compares the
//! process's cumulative busy ticks across that window. It is not a
//! system-wide load figure and is not meant to be one.

pub mod clock;
pub mod error;
pub mod poller;
pub mod samplers;
pub mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SampleError;
pub use poller::Poller;
pub use samplers::{
    BusyTickSource, CpuSampler, CpuTimePoint, DEFAULT_SAMPLE_PERIOD, DEFAULT_SPIN_ITERATIONS,
    FPS_WINDOW_MS, FrameRateCounter, MemorySampler, ProcessCpuTime, SpinWorkload, percent_busy,
};
pub use snapshot::{CpuSnapshot, FrameRateSnapshot, MemorySnapshot};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
