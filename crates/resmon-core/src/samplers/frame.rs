//! Frame-rate counter — frames per rolling one-second window.
//!
//! `on_frame_rendered` is called from the render thread once per completed
//! frame; `current_fps` is read from whichever thread displays it. The
//! published value lives in an atomic so readers never contend with the
//! render path beyond the brief window lock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::clock::{Clock, SystemClock};
use crate::snapshot::FrameRateSnapshot;

/// Length of the rolling FPS window.
pub const FPS_WINDOW_MS: i64 = 1_000;

struct Window {
    frames: u32,
    started_ms: i64,
}

/// Free-running frame counter. Runs for the lifetime of the render surface;
/// there is no stop API beyond dropping it with the surface.
pub struct FrameRateCounter {
    clock: Arc<dyn Clock>,
    window: Mutex<Window>,
    published: AtomicU32,
}

impl FrameRateCounter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let started_ms = clock.now_ms();
        Self {
            clock,
            window: Mutex::new(Window {
                frames: 0,
                started_ms,
            }),
            published: AtomicU32::new(0),
        }
    }

    /// Count one completed frame.
    ///
    /// The window roll is edge-triggered here: if the current window is
    /// already a full second old, the accumulated count is published and the
    /// counter resets *before* this frame is counted — a window holding
    /// exactly N frames publishes N at the boundary, and the boundary frame
    /// opens the next window.
    pub fn on_frame_rendered(&self) {
        let now = self.clock.now_ms();
        let mut w = match self.window.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if now - w.started_ms >= FPS_WINDOW_MS {
            self.published.store(w.frames, Ordering::Release);
            w.frames = 0;
            w.started_ms = now;
        }
        w.frames += 1;
    }

    /// FPS published at the last window boundary. 0 until a first window
    /// completes.
    pub fn current_fps(&self) -> u32 {
        self.published.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> FrameRateSnapshot {
        FrameRateSnapshot {
            frames_per_second: self.current_fps(),
        }
    }
}

impl Default for FrameRateCounter {
    fn default() -> Self {
        Self::new()
    }
}
