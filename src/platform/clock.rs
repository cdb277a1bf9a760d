//! Host frame timing
//!
//! Turns display-refresh timestamps into simulation deltas. The delta is
//! capped at [`MAX_FRAME_DT`] so a stalled tab does not produce one huge
//! integration step, and the baseline is re-primed after a pause.

use crate::consts::MAX_FRAME_DT;

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    /// Timestamp of the previous frame (ms), `None` until primed
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta in seconds since the previous frame, clamped to `[0, MAX_FRAME_DT]`
    ///
    /// The first call after construction or [`FrameClock::resume`] returns 0.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        }
    }

    /// Forget the baseline so the next frame does not see the paused time
    pub fn resume(&mut self) {
        self.last_ms = None;
    }
}
