//! Set/rest cycle for one exercise

use super::TimerError;
use super::countdown::Countdown;

/// Observable state of a set/rest cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetState {
    Idle { sets_done: u32 },
    Resting { sets_done: u32, seconds_left: u32 },
    Complete,
}

/// What a tick changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetEvent {
    /// Rest finished, next set can be tapped
    RestOver { sets_done: u32 },
    /// Last rest finished; emitted once per timer
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Resting,
    Complete,
}

#[derive(Debug, Clone)]
pub struct SetRestTimer {
    total_sets: u32,
    sets_done: u32,
    phase: Phase,
    rest: Countdown,
    completion_sent: bool,
}

impl SetRestTimer {
    /// `total_sets` of 0 is treated as a single set
    pub fn new(total_sets: u32) -> Self {
        Self {
            total_sets: total_sets.max(1),
            sets_done: 0,
            phase: Phase::Idle,
            rest: Countdown::new(0),
            completion_sent: false,
        }
    }

    pub fn total_sets(&self) -> u32 {
        self.total_sets
    }

    pub fn state(&self) -> SetState {
        match self.phase {
            Phase::Idle => SetState::Idle {
                sets_done: self.sets_done,
            },
            Phase::Resting => SetState::Resting {
                sets_done: self.sets_done,
                seconds_left: self.rest.remaining(),
            },
            Phase::Complete => SetState::Complete,
        }
    }

    /// Index of the only set that can be tapped right now
    pub fn next_set(&self) -> Option<u32> {
        (self.phase == Phase::Idle && self.sets_done < self.total_sets).then_some(self.sets_done)
    }

    /// Mark set `index` (0-based) as done and start resting for `rest_seconds`
    pub fn tap_set(&mut self, index: u32, rest_seconds: u32) -> Result<SetState, TimerError> {
        if self.next_set() != Some(index) {
            return Err(TimerError::SetNotTappable {
                index,
                next: self.next_set(),
            });
        }

        self.sets_done += 1;
        self.phase = Phase::Resting;
        self.rest.restart(rest_seconds);
        Ok(self.state())
    }

    pub fn tick(&mut self) -> Option<SetEvent> {
        if self.phase != Phase::Resting || !self.rest.tick() {
            return None;
        }

        if self.sets_done < self.total_sets {
            self.phase = Phase::Idle;
            return Some(SetEvent::RestOver {
                sets_done: self.sets_done,
            });
        }

        self.phase = Phase::Complete;
        if self.completion_sent {
            return None;
        }
        self.completion_sent = true;
        Some(SetEvent::Completed)
    }

    /// Rest progress, 0.0 when not resting
    pub fn rest_fraction_left(&self) -> f32 {
        match self.phase {
            Phase::Resting => self.rest.fraction_left(),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick_n(timer: &mut SetRestTimer, n: u32) -> Vec<SetEvent> {
        (0..n).filter_map(|_| timer.tick()).collect()
    }

    #[test]
    fn test_three_set_cycle() {
        let mut timer = SetRestTimer::new(3);
        assert_eq!(timer.state(), SetState::Idle { sets_done: 0 });

        let state = timer.tap_set(0, 60).unwrap();
        assert_eq!(state, SetState::Resting { sets_done: 1, seconds_left: 60 });

        assert!(tick_n(&mut timer, 59).is_empty());
        assert_eq!(timer.tick(), Some(SetEvent::RestOver { sets_done: 1 }));
        assert_eq!(timer.state(), SetState::Idle { sets_done: 1 });

        timer.tap_set(1, 60).unwrap();
        assert_eq!(tick_n(&mut timer, 60), vec![SetEvent::RestOver { sets_done: 2 }]);

        timer.tap_set(2, 60).unwrap();
        assert_eq!(tick_n(&mut timer, 60), vec![SetEvent::Completed]);
        assert_eq!(timer.state(), SetState::Complete);

        // further ticks and state reads never fire again
        assert!(tick_n(&mut timer, 120).is_empty());
        assert_eq!(timer.state(), SetState::Complete);
    }

    #[test]
    fn test_only_next_set_is_tappable() {
        let mut timer = SetRestTimer::new(2);
        assert!(matches!(
            timer.tap_set(1, 10),
            Err(TimerError::SetNotTappable { index: 1, next: Some(0) })
        ));

        timer.tap_set(0, 10).unwrap();
        // resting: nothing is tappable
        assert!(timer.tap_set(1, 10).is_err());
        assert_eq!(timer.state(), SetState::Resting { sets_done: 1, seconds_left: 10 });
    }

    #[test]
    fn test_zero_sets_means_one() {
        let mut timer = SetRestTimer::new(0);
        assert_eq!(timer.total_sets(), 1);
        timer.tap_set(0, 1).unwrap();
        assert_eq!(timer.tick(), Some(SetEvent::Completed));
        assert_eq!(timer.next_set(), None);
    }

    #[test]
    fn test_zero_rest_resolves_next_tick() {
        let mut timer = SetRestTimer::new(2);
        let state = timer.tap_set(0, 0).unwrap();
        assert_eq!(state, SetState::Resting { sets_done: 1, seconds_left: 0 });
        assert_eq!(timer.tick(), Some(SetEvent::RestOver { sets_done: 1 }));
    }

    #[test]
    fn test_rest_fraction() {
        let mut timer = SetRestTimer::new(2);
        assert_eq!(timer.rest_fraction_left(), 0.0);
        timer.tap_set(0, 4).unwrap();
        timer.tick();
        assert_eq!(timer.rest_fraction_left(), 0.75);
    }
}
