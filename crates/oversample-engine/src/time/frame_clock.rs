use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Seconds since the clock was created, accumulated from clamped deltas.
    pub elapsed: f32,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Produces `FrameTime` snapshots.
///
/// Delta time is clamped so a debugger pause or a multi-second stall (a
/// large supersampled target allocation, for one) does not jump animations.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f32,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            elapsed: 0.0,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Advances the clock.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = self.clamp(now.saturating_duration_since(self.last));
        self.last = now;
        self.advance(dt)
    }

    fn clamp(&self, dt: Duration) -> Duration {
        dt.clamp(self.dt_min, self.dt_max)
    }

    fn advance(&mut self, dt: Duration) -> FrameTime {
        let dt = dt.as_secs_f32();
        self.elapsed += dt;

        let ft = FrameTime {
            dt,
            elapsed: self.elapsed,
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
    fn clamps_long_stalls() {
        let clock = FrameClock::new();
        assert_eq!(clock.clamp(Duration::from_secs(5)), Duration::from_millis(250));
        assert_eq!(clock.clamp(Duration::ZERO), Duration::from_micros(100));
        assert_eq!(clock.clamp(Duration::from_millis(16)), Duration::from_millis(16));
    }

    #[test]
    fn frame_index_and_elapsed_accumulate() {
        let mut clock = FrameClock::new();
        let a = clock.advance(Duration::from_millis(100));
        let b = clock.advance(Duration::from_millis(50));

        assert_eq!((a.frame_index, b.frame_index), (0, 1));
        assert!((b.elapsed - 0.15).abs() < 1e-6);
        assert!((b.dt - 0.05).abs() < 1e-6);
    }
}
