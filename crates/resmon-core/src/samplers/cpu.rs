//! CPU sampler — process busy-tick delta over a spin-workload window.
//!
//! The reading is a *self-process* approximation, not system-wide load: each
//! tick pins a measurement window open with a fixed spin workload and
//! compares the process's cumulative busy ticks before and after. The tick
//! counter is opaque to the sampler (jiffies on Linux, milliseconds from
//! `getrusage` elsewhere); percent is ticks-per-wall-millisecond scaled and
//! clamped to `[0, 100]`.

use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::SampleError;
use crate::snapshot::CpuSnapshot;

/// Spin iterations per measurement window. Sized to hold the window open
/// for a measurable handful of milliseconds on current hardware.
pub const DEFAULT_SPIN_ITERATIONS: u64 = 10_000_000;

/// One reading of the process CPU-time counter against the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTimePoint {
    pub wall_clock_ms: i64,
    pub busy_ticks: u64,
}

/// Cumulative busy-tick counter for the current process.
///
/// Implementations promise a monotonic counter and nothing about its unit.
pub trait BusyTickSource: Send {
    fn busy_ticks(&self) -> Result<u64, SampleError>;
}

/// OS-backed busy-tick counter: `utime + stime` from `/proc/self/stat` on
/// Linux, `getrusage(RUSAGE_SELF)` user+system milliseconds on other
/// Unixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCpuTime;

impl BusyTickSource for ProcessCpuTime {
    #[cfg(target_os = "linux")]
    fn busy_ticks(&self) -> Result<u64, SampleError> {
        let stat = std::fs::read_to_string("/proc/self/stat")
            .map_err(|e| SampleError::unavailable(format!("/proc/self/stat: {e}")))?;
        parse_stat_busy_ticks(&stat)
            .ok_or_else(|| SampleError::unavailable("malformed /proc/self/stat"))
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    fn busy_ticks(&self) -> Result<u64, SampleError> {
        // SAFETY: getrusage fills a properly-sized rusage struct for the
        // calling process; RUSAGE_SELF is always a valid target.
        let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
        if rc != 0 {
            return Err(SampleError::unavailable("getrusage(RUSAGE_SELF) failed"));
        }
        let to_ms = |tv: libc::timeval| tv.tv_sec as u64 * 1_000 + tv.tv_usec as u64 / 1_000;
        Ok(to_ms(usage.ru_utime) + to_ms(usage.ru_stime))
    }

    #[cfg(not(unix))]
    fn busy_ticks(&self) -> Result<u64, SampleError> {
        Err(SampleError::unavailable(
            "no process CPU-time source on this platform",
        ))
    }
}

/// Extract `utime + stime` (fields 14 and 15) from a `/proc/<pid>/stat`
/// line.
///
/// Fields are located after the last `)` so executable names containing
/// spaces or parentheses cannot shift the positions.
pub fn parse_stat_busy_ticks(stat: &str) -> Option<u64> {
    let (_, rest) = stat.rsplit_once(')')?;
    let mut fields = rest.split_whitespace();
    // rest starts at field 3 (state), so utime (field 14) is at index 11.
    let utime = fields.nth(11)?.parse::<u64>().ok()?;
    let stime = fields.next()?.parse::<u64>().ok()?;
    utime.checked_add(stime)
}

/// Fixed, deterministic CPU-bound workload that holds the measurement
/// window open.
///
/// Not useful work — the loop exists so the busy-tick delta is large enough
/// to measure. Skipping it would turn the reading into noise, so it always
/// runs; only the iteration count is adjustable (tests shrink it).
#[derive(Debug, Clone, Copy)]
pub struct SpinWorkload {
    iterations: u64,
}

impl SpinWorkload {
    pub fn new(iterations: u64) -> Self {
        Self { iterations }
    }

    /// Run the spin loop to completion. Returns the accumulator through
    /// `black_box` so the optimizer cannot delete the loop.
    pub fn run(&self) -> u64 {
        let mut acc = 0u64;
        for i in 0..self.iterations {
            acc = acc.wrapping_add(i.wrapping_mul(i));
        }
        std::hint::black_box(acc)
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

impl Default for SpinWorkload {
    fn default() -> Self {
        Self::new(DEFAULT_SPIN_ITERATIONS)
    }
}

/// Compute busy percent from a window's start/end readings.
///
/// `Err(DegenerateWindow)` when no wall-clock time elapsed. Backwards tick
/// deltas (counter resets) clamp to 0; deltas outrunning the wall clock
/// clamp to 100.
pub fn percent_busy(start: CpuTimePoint, end: CpuTimePoint) -> Result<f64, SampleError> {
    let wall_ms = end.wall_clock_ms - start.wall_clock_ms;
    if wall_ms <= 0 {
        return Err(SampleError::DegenerateWindow);
    }
    let ticks = end.busy_ticks as f64 - start.busy_ticks as f64;
    Ok((ticks / wall_ms as f64 * 100.0).clamp(0.0, 100.0))
}

/// Samples process CPU busyness over a spin-workload window.
pub struct CpuSampler {
    clock: Arc<dyn Clock>,
    ticks: Box<dyn BusyTickSource>,
    workload: SpinWorkload,
    last: CpuSnapshot,
}

impl CpuSampler {
    /// System clock, OS tick source, default workload.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(SystemClock),
            Box::new(ProcessCpuTime),
            SpinWorkload::default(),
        )
    }

    /// Fully injected constructor; tests drive exact clocks and tick values
    /// through this.
    pub fn with_parts(
        clock: Arc<dyn Clock>,
        ticks: Box<dyn BusyTickSource>,
        workload: SpinWorkload,
    ) -> Self {
        Self {
            clock,
            ticks,
            workload,
            last: CpuSnapshot::default(),
        }
    }

    /// Run one measurement window and publish the resulting snapshot.
    ///
    /// A degenerate window keeps the previous snapshot silently; an
    /// unreadable tick source keeps it too, with a warning. Either way the
    /// next tick retries from scratch — sampling never stops over one bad
    /// read.
    pub fn sample(&mut self) -> CpuSnapshot {
        match self.measure() {
            Ok(snap) => {
                self.last = snap;
                snap
            }
            Err(SampleError::DegenerateWindow) => self.last,
            Err(e) => {
                warn!("cpu sample skipped: {e}");
                self.last
            }
        }
    }

    fn measure(&self) -> Result<CpuSnapshot, SampleError> {
        let start = CpuTimePoint {
            wall_clock_ms: self.clock.now_ms(),
            busy_ticks: self.ticks.busy_ticks()?,
        };

        self.workload.run();

        let end = CpuTimePoint {
            wall_clock_ms: self.clock.now_ms(),
            busy_ticks: self.ticks.busy_ticks()?,
        };

        Ok(CpuSnapshot {
            percent_busy: percent_busy(start, end)?,
        })
    }

    /// Last published snapshot.
    pub fn last(&self) -> CpuSnapshot {
        self.last
    }
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Tick source that replays scripted counter values, repeating the last
    /// one when the script runs out.
    struct ScriptedTicks {
        values: Mutex<VecDeque<u64>>,
        last: Mutex<u64>,
    }

    impl ScriptedTicks {
        fn new(values: &[u64]) -> Self {
            Self {
                values: Mutex::new(values.iter().copied().collect()),
                last: Mutex::new(values.last().copied().unwrap_or(0)),
            }
        }
    }

    impl BusyTickSource for ScriptedTicks {
        fn busy_ticks(&self) -> Result<u64, SampleError> {
            match self.values.lock().unwrap().pop_front() {
                Some(v) => {
                    *self.last.lock().unwrap() = v;
                    Ok(v)
                }
                None => Ok(*self.last.lock().unwrap()),
            }
        }
    }

    /// Tick source that always fails.
    struct BrokenTicks;

    impl BusyTickSource for BrokenTicks {
        fn busy_ticks(&self) -> Result<u64, SampleError> {
            Err(SampleError::unavailable("scripted failure"))
        }
    }

    /// Clock that replays scripted timestamps, repeating the last one when
    /// the script runs out. Each `sample()` consumes two readings (window
    /// start and end).
    struct ScriptedClock {
        values: Mutex<VecDeque<i64>>,
        last: Mutex<i64>,
    }

    impl ScriptedClock {
        fn new(values: &[i64]) -> Self {
            Self {
                values: Mutex::new(values.iter().copied().collect()),
                last: Mutex::new(values.last().copied().unwrap_or(0)),
            }
        }
    }

    impl Clock for ScriptedClock {
        fn now_ms(&self) -> i64 {
            match self.values.lock().unwrap().pop_front() {
                Some(v) => {
                    *self.last.lock().unwrap() = v;
                    v
                }
                None => *self.last.lock().unwrap(),
            }
        }
    }

    fn point(wall_clock_ms: i64, busy_ticks: u64) -> CpuTimePoint {
        CpuTimePoint {
            wall_clock_ms,
            busy_ticks,
        }
    }

    #[test]
    fn percent_busy_reference_scenario() {
        // 200 ticks over 500 ms -> 40.0%
        let p = percent_busy(point(0, 1_000), point(500, 1_200)).unwrap();
        assert_eq!(p, 40.0);
    }

    #[test]
    fn percent_busy_clamps_to_100() {
        // Delta outruns the wall clock (multi-core bursts can do this).
        let p = percent_busy(point(0, 0), point(10, 5_000)).unwrap();
        assert_eq!(p, 100.0);
    }

    #[test]
    fn percent_busy_clamps_negative_delta_to_0() {
        let p = percent_busy(point(0, 2_000), point(500, 1_000)).unwrap();
        assert_eq!(p, 0.0);
    }

    #[test]
    fn percent_busy_zero_window_is_degenerate() {
        let err = percent_busy(point(500, 0), point(500, 100)).unwrap_err();
        assert!(matches!(err, SampleError::DegenerateWindow));
    }

    #[test]
    fn percent_busy_backwards_window_is_degenerate() {
        let err = percent_busy(point(500, 0), point(400, 100)).unwrap_err();
        assert!(matches!(err, SampleError::DegenerateWindow));
    }

    #[test]
    fn percent_busy_never_nan() {
        for (w0, w1) in [(0i64, 1i64), (0, 500), (0, i64::MAX / 2)] {
            for (t0, t1) in [(0u64, 0u64), (u64::MAX / 2, 0), (0, u64::MAX / 2)] {
                let p = percent_busy(point(w0, t0), point(w1, t1)).unwrap();
                assert!(!p.is_nan());
                assert!((0.0..=100.0).contains(&p));
            }
        }
    }

    #[test]
    fn sampler_computes_reference_window() {
        let clock = ScriptedClock::new(&[0, 500]);
        let ticks = ScriptedTicks::new(&[1_000, 1_200]);
        let mut sampler =
            CpuSampler::with_parts(Arc::new(clock), Box::new(ticks), SpinWorkload::new(0));

        let snap = sampler.sample();
        assert_eq!(snap.percent_busy, 40.0);
        assert_eq!(sampler.last().percent_busy, 40.0);
    }

    #[test]
    fn sampler_idempotent_when_clock_does_not_advance() {
        // First window is real; the two after it see zero elapsed time.
        let clock = ScriptedClock::new(&[0, 500, 1_000, 1_000, 1_000, 1_000]);
        let ticks = ScriptedTicks::new(&[1_000, 1_200, 1_300, 1_400, 1_500, 1_600]);
        let mut sampler =
            CpuSampler::with_parts(Arc::new(clock), Box::new(ticks), SpinWorkload::new(0));

        let good = sampler.sample();
        assert_eq!(good.percent_busy, 40.0);

        let a = sampler.sample();
        let b = sampler.sample();
        assert_eq!(a.percent_busy, 40.0);
        assert_eq!(b.percent_busy, 40.0);
    }

    #[test]
    fn sampler_with_frozen_clock_keeps_default_snapshot() {
        let frozen = Arc::new(ManualClock::new(9_000));
        let mut sampler = CpuSampler::with_parts(
            frozen,
            Box::new(ScriptedTicks::new(&[500, 900])),
            SpinWorkload::new(0),
        );

        let a = sampler.sample();
        let b = sampler.sample();
        assert_eq!(a.percent_busy, 0.0);
        assert_eq!(b.percent_busy, 0.0);
    }

    #[test]
    fn sampler_keeps_previous_snapshot_when_ticks_unreadable() {
        let clock = Arc::new(ManualClock::new(0));
        let mut sampler =
            CpuSampler::with_parts(clock, Box::new(BrokenTicks), SpinWorkload::new(0));

        let snap = sampler.sample();
        assert_eq!(snap.percent_busy, 0.0);
        let snap2 = sampler.sample();
        assert_eq!(snap2.percent_busy, 0.0);
    }

    #[test]
    fn parse_stat_sums_utime_and_stime() {
        let stat = "12345 (resmon) S 1 12345 12345 0 -1 4194304 500 0 0 0 1000 200 0 0 20 0 4 0 100000 10000000 250 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0";
        assert_eq!(parse_stat_busy_ticks(stat), Some(1_200));
    }

    #[test]
    fn parse_stat_handles_spaces_in_comm() {
        let stat = "999 (Web Content (x)) R 1 999 999 0 -1 0 0 0 0 0 42 8 0 0 20 0 1 0 5 0 0 0";
        assert_eq!(parse_stat_busy_ticks(stat), Some(50));
    }

    #[test]
    fn parse_stat_rejects_truncated_line() {
        assert_eq!(parse_stat_busy_ticks("1 (x) R 1 2 3"), None);
        assert_eq!(parse_stat_busy_ticks(""), None);
        assert_eq!(parse_stat_busy_ticks("no paren here"), None);
    }

    #[test]
    fn parse_stat_rejects_non_numeric_fields() {
        let stat = "1 (x) R 1 1 1 0 -1 0 0 0 0 0 abc 2 0 0 20 0 1 0 5 0 0 0";
        assert_eq!(parse_stat_busy_ticks(stat), None);
    }

    #[test]
    fn spin_workload_runs_requested_iterations() {
        assert_eq!(SpinWorkload::new(0).run(), 0);
        // sum of i*i for i in 0..4 = 0 + 1 + 4 + 9
        assert_eq!(SpinWorkload::new(4).run(), 14);
        assert_eq!(SpinWorkload::default().iterations(), DEFAULT_SPIN_ITERATIONS);
    }

    #[cfg(unix)]
    #[test]
    fn process_cpu_time_is_monotonic() {
        let src = ProcessCpuTime;
        let a = src.busy_ticks().unwrap();
        SpinWorkload::new(2_000_000).run();
        let b = src.busy_ticks().unwrap();
        assert!(b >= a, "busy ticks went backwards: {a} -> {b}");
    }
}
