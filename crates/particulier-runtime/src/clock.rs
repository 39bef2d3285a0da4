//! Frame clock

use std::time::Instant;

/// Longest frame delta handed to systems, in seconds
const MAX_FRAME_DELTA: f64 = 0.25;

/// Tracks per-frame deltas and total elapsed time
pub struct FrameClock {
    /// Total elapsed time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Number of frames ticked so far
    pub frame: u64,
    last_instant: Instant,
    first_tick: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            frame: 0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance from the wall clock. Call once per frame.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            return self.advance(0.0);
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(elapsed)
    }

    /// Advance by an explicit delta, for fixed-step or replayed loops.
    pub fn advance(&mut self, dt: f64) -> f32 {
        self.delta_time = dt.clamp(0.0, MAX_FRAME_DELTA);
        self.total_time += self.delta_time;
        self.frame += 1;
        self.delta_time as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_defaults() {
        let clock = FrameClock::new();
        assert_eq!(clock.total_time, 0.0);
        assert_eq!(clock.delta_time, 0.0);
        assert_eq!(clock.frame, 0);
    }

    #[test]
    fn test_first_tick_zero_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.frame, 1);
    }

    #[test]
    fn test_advance_accumulates() {
        let mut clock = FrameClock::new();
        clock.advance(0.016);
        clock.advance(0.016);
        assert!((clock.total_time - 0.032).abs() < 1e-10);
        assert_eq!(clock.frame, 2);
    }

    #[test]
    fn test_advance_clamps_long_frames() {
        let mut clock = FrameClock::new();
        let dt = clock.advance(3.0);
        assert!((dt - 0.25).abs() < 1e-6);
        assert_eq!(clock.advance(-1.0), 0.0);
    }
}
