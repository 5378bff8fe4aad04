//! Isometric hold countdown, driven by the user

use super::countdown::Countdown;
use crate::timespec::parse_time_to_seconds;

#[derive(Debug, Clone)]
pub struct HoldTimer {
    countdown: Countdown,
    completion_sent: bool,
}

impl HoldTimer {
    pub fn new(seconds: u32) -> Self {
        Self {
            countdown: Countdown::new(seconds),
            completion_sent: false,
        }
    }

    /// Hold length from the exercise's time-spec
    pub fn from_time_spec(time: &str) -> Self {
        Self::new(parse_time_to_seconds(time))
    }

    /// Exercises without a parsable time have no hold timer
    pub fn has_timer(&self) -> bool {
        self.countdown.duration() > 0
    }

    pub fn is_finished(&self) -> bool {
        self.has_timer() && self.countdown.is_finished()
    }

    pub fn start(&mut self) {
        if self.is_finished() {
            self.reset();
        }
        if self.has_timer() {
            self.countdown.start();
        }
    }

    pub fn pause(&mut self) {
        self.countdown.pause();
    }

    pub fn reset(&mut self) {
        self.countdown.reset();
        self.completion_sent = false;
    }

    /// Single play/pause/restart control: a finished timer is reset,
    /// otherwise running state is flipped
    pub fn control(&mut self) {
        if self.is_finished() {
            self.reset();
        } else if self.countdown.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// True exactly once when the hold reaches zero
    pub fn tick(&mut self) -> bool {
        if self.countdown.tick() && !self.completion_sent {
            self.completion_sent = true;
            return true;
        }
        false
    }

    pub fn remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn is_running(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn fraction_left(&self) -> f32 {
        self.countdown.fraction_left()
    }
}
