//! Frame clock and periodic timers
//!
//! Nothing in the simulation reads a wall clock. Every tick receives its
//! delta explicitly, which keeps runs reproducible.

/// Tick clock: delta of the current frame, total elapsed time, frame count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Time {
    delta: f32,
    elapsed: f64,
    frame: u64,
}

impl Time {
    /// Create a clock at frame zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame that lasted `delta` seconds. Negative deltas count as zero.
    pub fn advance(&mut self, delta: f32) {
        self.delta = delta.max(0.0);
        self.elapsed += f64::from(self.delta);
        self.frame += 1;
    }

    /// Seconds covered by the current frame
    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.delta
    }

    /// Seconds since the clock started
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    /// Number of frames advanced so far
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

/// Repeating timer fed with frame deltas.
///
/// Replaces "wait N seconds then act" coroutines: the owner calls `tick()`
/// every frame it is active and acts once per returned firing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    period: f32,
    accumulated: f32,
}

impl Timer {
    /// Create a timer firing every `period` seconds
    #[must_use]
    pub fn new(period: f32) -> Self {
        Self {
            period: period.max(f32::EPSILON),
            accumulated: 0.0,
        }
    }

    /// Add `delta` seconds and return how many periods completed.
    pub fn tick(&mut self, delta: f32) -> u32 {
        self.accumulated += delta.max(0.0);
        if self.accumulated < self.period {
            return 0;
        }

        let fired = (self.accumulated / self.period).floor();
        self.accumulated = (self.accumulated - fired * self.period).max(0.0);
        fired as u32
    }

    /// Forget any partial progress
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }

    /// Period in seconds
    #[must_use]
    pub fn period(&self) -> f32 {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_advance() {
        let mut time = Time::new();
        time.advance(0.5);
        time.advance(0.25);

        assert_eq!(time.frame_count(), 2);
        assert!((time.delta_seconds() - 0.25).abs() < f32::EPSILON);
        assert!((time.elapsed_seconds() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_time_negative_delta() {
        let mut time = Time::new();
        time.advance(-1.0);
        assert_eq!(time.delta_seconds(), 0.0);
        assert_eq!(time.elapsed_seconds(), 0.0);
    }

    #[test]
    fn test_timer_fires_per_period() {
        let mut timer = Timer::new(2.0);
        assert_eq!(timer.tick(1.5), 0);
        assert_eq!(timer.tick(1.0), 1);
        assert_eq!(timer.tick(4.5), 2);
    }

    #[test]
    fn test_timer_large_delta_with_tiny_period() {
        let mut timer = Timer::new(0.0);
        assert_eq!(timer.period(), f32::EPSILON);

        // Finishes in one step instead of subtracting EPSILON forever
        let fired = timer.tick(4.0);
        assert!(fired > 0);
        assert!(timer.tick(0.0) <= 1);
    }

    #[test]
    fn test_timer_reset() {
        let mut timer = Timer::new(1.0);
        timer.tick(0.9);
        timer.reset();
        assert_eq!(timer.tick(0.5), 0);
    }
}
