// crates/input_core/src/frame_clock.rs

use std::time::Instant;

/// Upper bound on one frame's delta.
pub const MAX_FRAME_DT: f32 = 0.25;

/// Wall-clock frame timer for hosts that do not track time themselves.
pub struct FrameClock {
    last_frame_time: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_frame_time: Instant::now(),
        }
    }

    /// Update the frame timer and return the clamped frame delta.
    /// Clamps to 0.25s so a stalled frame (dragging the window, a
    /// breakpoint) does not fast-forward repeat and rebind timers.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let frame_dt = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        clamp_frame_dt(frame_dt)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

pub fn clamp_frame_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    }
}
