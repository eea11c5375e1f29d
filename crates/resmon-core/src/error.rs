//! Sampling error kinds.

use thiserror::Error;

/// Failure of a single sampling tick.
///
/// Both kinds are non-fatal and locally recovered: the affected sampler keeps
/// its last published snapshot and retries on the next tick. No error here
/// ever tears down a polling loop.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The OS query failed or returned malformed data.
    #[error("metric unavailable: {reason}")]
    UnavailableMetric { reason: String },

    /// Zero or negative elapsed wall-clock time in a measurement window.
    #[error("degenerate sampling window (no wall-clock time elapsed)")]
    DegenerateWindow,
}

impl SampleError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        Self::UnavailableMetric {
            reason: reason.into(),
        }
    }
}
