use std::time::{Duration, Instant};

// Delta-time clamps. The floor keeps zero-dt out of tight redraw loops, the
// ceiling keeps animation from jumping after a debugger pause or a minimized
// window.
const DT_MIN: Duration = Duration::from_micros(100);
const DT_MAX: Duration = Duration::from_millis(250);

/// Timing snapshot for one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Clamped seconds accumulated since the clock was created.
    ///
    /// Animation keyed off this value stays continuous across stalls,
    /// because a stalled frame contributes at most the clamp ceiling.
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Produces one [`FrameTime`] per presented frame.
///
/// Use one clock per render loop; sharing a clock across windows would let
/// one window's tick swallow another's delta.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: Duration,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            elapsed: Duration::ZERO,
            frame_index: 0,
        }
    }

    /// Moves the baseline to now, e.g. when resuming from suspension.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last).clamp(DT_MIN, DT_MAX);

        self.last = now;
        self.elapsed += dt;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.elapsed.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_accumulates_clamped_deltas() {
        let mut clock = FrameClock::new();

        let a = clock.tick();
        std::thread::sleep(Duration::from_millis(2));
        let b = clock.tick();

        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
        assert!(b.elapsed >= a.elapsed + b.dt - f32::EPSILON);
        assert!(b.dt >= DT_MIN.as_secs_f32());
        assert!(b.dt <= DT_MAX.as_secs_f32());
    }
}
