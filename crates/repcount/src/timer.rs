//! Frame timing.

use std::{
    fmt, mem,
    time::{Duration, Instant},
};

use crate::filter::{Ema, Filter};

const EMA_ALPHA: f32 = 0.3;

/// Measures how long an operation takes.
///
/// Keeps the most recent measurement and a moving average. Displaying the timer with `{}` shows
/// the average.
pub struct Timer {
    name: &'static str,
    ema: Ema,
    last: Duration,
    avg_secs: f32,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ema: Ema::new(EMA_ALPHA),
            last: Duration::ZERO,
            avg_secs: 0.0,
        }
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&mut self, timee: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = timee();
        self.record(start.elapsed());
        value
    }

    fn record(&mut self, duration: Duration) {
        self.last = duration;
        self.avg_secs = self.ema.push(duration.as_secs_f32());
    }

    /// Returns the duration of the most recently timed operation.
    #[inline]
    pub fn last(&self) -> Duration {
        self.last
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.01}ms", self.name, self.avg_secs * 1000.0)
    }
}

/// Counts frames per second of frame timestamps.
#[derive(Debug, Default, Clone)]
pub struct FpsCounter {
    frames: u32,
    window_start: Option<Instant>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a frame arriving at `now`.
    ///
    /// Once at least a second has passed since the current counting window started, returns the
    /// number of frames counted in that window (including this one) and starts a new window.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        if now.saturating_duration_since(start) >= Duration::from_secs(1) {
            self.window_start = Some(now);
            Some(mem::replace(&mut self.frames, 0))
        } else {
            None
        }
    }
}

/// Computes the instantaneous frame rate from the time between two consecutive frames.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame arriving at `now` and returns `1 / seconds since the previous frame`.
    ///
    /// Returns 0.0 for the first frame, and when no time has passed since the previous frame.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let fps = match self.last {
            Some(last) => {
                let dt = now.saturating_duration_since(last).as_secs_f32();
                if dt > 0.0 {
                    dt.recip()
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        self.last = Some(now);
        fps
    }
}
