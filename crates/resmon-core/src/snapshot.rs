//! Immutable point-in-time values published by the samplers.
//!
//! Snapshots are plain `Copy` values with no cross-references; a sampler
//! recreates one per tick and the display layer renders whichever one it
//! last saw. The `Display` impls produce the card strings the dashboard
//! shows verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

const BYTES_PER_GB: f64 = (1024u64 * 1024 * 1024) as f64;

/// Point-in-time memory reading.
///
/// `used_bytes <= total_bytes` holds for every snapshot produced by
/// [`MemorySampler`](crate::MemorySampler); readings that would violate it
/// are rejected as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl MemorySnapshot {
    pub fn used_gb(&self) -> f64 {
        self.used_bytes as f64 / BYTES_PER_GB
    }

    pub fn total_gb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_GB
    }
}

impl fmt::Display for MemorySnapshot {
    /// Renders as `"{used:.1}/{total:.1}GB"`, e.g. `6.0/8.0GB`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}/{:.1}GB", self.used_gb(), self.total_gb())
    }
}

/// Share of a measurement window the process spent busy, in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub percent_busy: f64,
}

impl fmt::Display for CpuSnapshot {
    /// Renders as `"{percent:.1}%"`, e.g. `37.5%`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.percent_busy)
    }
}

/// Frames counted in the last completed one-second window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameRateSnapshot {
    pub frames_per_second: u32,
}

impl fmt::Display for FrameRateSnapshot {
    /// Renders as `"{fps} FPS"`, e.g. `60 FPS`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} FPS", self.frames_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_display_one_decimal_gb() {
        let snap = MemorySnapshot {
            used_bytes: 6_442_450_944,
            total_bytes: 8_589_934_592,
        };
        assert_eq!(snap.to_string(), "6.0/8.0GB");
    }

    #[test]
    fn memory_display_rounds_fractions() {
        let snap = MemorySnapshot {
            used_bytes: 3_865_470_566, // ~3.6 GB
            total_bytes: 17_179_869_184,
        };
        assert_eq!(snap.to_string(), "3.6/16.0GB");
    }

    #[test]
    fn memory_gb_conversion_uses_binary_gigabytes() {
        let snap = MemorySnapshot {
            used_bytes: 1 << 30,
            total_bytes: 2 << 30,
        };
        assert_eq!(snap.used_gb(), 1.0);
        assert_eq!(snap.total_gb(), 2.0);
    }

    #[test]
    fn cpu_display_one_decimal_percent() {
        assert_eq!(CpuSnapshot { percent_busy: 40.0 }.to_string(), "40.0%");
        assert_eq!(CpuSnapshot { percent_busy: 37.55 }.to_string(), "37.6%");
        assert_eq!(CpuSnapshot::default().to_string(), "0.0%");
    }

    #[test]
    fn fps_display() {
        let snap = FrameRateSnapshot {
            frames_per_second: 30,
        };
        assert_eq!(snap.to_string(), "30 FPS");
    }

    #[test]
    fn snapshots_default_to_zero() {
        assert_eq!(MemorySnapshot::default().used_bytes, 0);
        assert_eq!(CpuSnapshot::default().percent_busy, 0.0);
        assert_eq!(FrameRateSnapshot::default().frames_per_second, 0);
    }
}
