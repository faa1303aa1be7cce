use std::time::{Duration, Instant};

/// Timing of one presented frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the previous tick (or since `start` for the first frame).
    pub dt: Duration,

    /// 1-based number of the frame just presented.
    pub frame: u64,
}

/// Counts presented frames and measures how long the loop ran.
#[derive(Debug, Clone)]
pub struct FrameClock {
    started: Instant,
    last: Instant,
    frames: u64,
    slowest: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: now,
            frames: 0,
            slowest: Duration::ZERO,
        }
    }

    /// Resets the baseline. Call right before the first frame so setup time
    /// is not counted.
    pub fn start(&mut self) {
        *self = Self::new();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        self.frames += 1;
        self.slowest = self.slowest.max(dt);

        FrameTime {
            dt,
            frame: self.frames,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Time from `start` to the latest tick.
    pub fn elapsed(&self) -> Duration {
        self.last.saturating_duration_since(self.started)
    }

    pub fn slowest_frame(&self) -> Duration {
        self.slowest
    }

    /// `None` until at least one frame took measurable time.
    pub fn average_fps(&self) -> Option<f64> {
        let secs = self.elapsed().as_secs_f64();
        (self.frames > 0 && secs > 0.0).then(|| self.frames as f64 / secs)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
