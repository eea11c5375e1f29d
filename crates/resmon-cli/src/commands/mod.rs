pub mod monitor;
pub mod snapshot;
pub mod watch;

use std::sync::Arc;

use resmon_core::{CpuSampler, ProcessCpuTime, SpinWorkload, SystemClock};

/// Build a CPU sampler with the requested spin-workload size.
///
/// Every subcommand accepts `--spin-iterations` so slow machines (or tests)
/// can shrink the measurement window's cost without changing its semantics.
pub fn make_cpu_sampler(spin_iterations: u64) -> CpuSampler {
    CpuSampler::with_parts(
        Arc::new(SystemClock),
        Box::new(ProcessCpuTime),
        SpinWorkload::new(spin_iterations),
    )
}
