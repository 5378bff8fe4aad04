//! One-second countdown shared by rest periods and isometric holds

/// Counts whole seconds down to zero while running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Back to the full duration, stopped
    pub fn reset(&mut self) {
        self.remaining = self.duration;
        self.running = false;
    }

    /// Reset to a new duration and start right away
    pub fn restart(&mut self, duration: u32) {
        self.duration = duration;
        self.remaining = duration;
        self.running = true;
    }

    /// Advance one second. Returns true on the tick that reaches zero;
    /// the countdown stops there.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return true;
        }
        false
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    /// Share of time left, for progress bars
    pub fn fraction_left(&self) -> f32 {
        if self.duration == 0 {
            return 0.0;
        }
        self.remaining as f32 / self.duration as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_down_only_while_running() {
        let mut c = Countdown::new(3);
        assert!(!c.tick());
        assert_eq!(c.remaining(), 3);

        c.start();
        assert!(!c.tick());
        assert!(!c.tick());
        assert!(c.tick());
        assert!(c.is_finished());
        assert!(!c.is_running());

        // stays at zero
        assert!(!c.tick());
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn test_pause_and_reset() {
        let mut c = Countdown::new(5);
        c.start();
        c.tick();
        c.pause();
        c.tick();
        assert_eq!(c.remaining(), 4);

        c.reset();
        assert_eq!(c.remaining(), 5);
        assert!(!c.is_running());
        assert_eq!(c.fraction_left(), 1.0);
    }

    #[test]
    fn test_zero_duration_finishes_on_first_tick() {
        let mut c = Countdown::new(10);
        c.restart(0);
        assert!(c.tick());
        assert_eq!(c.fraction_left(), 0.0);
    }
}
