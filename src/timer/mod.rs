//! Exercise timers - rest between sets and isometric holds
//!
//! Every timer is a plain state machine advanced by `tick()`. A single
//! `TimerService` owns all of them and is ticked once per second, either by
//! hand (tests) or by the task started with [`spawn_ticker`].

mod countdown;
mod hold;
mod sets;

pub use countdown::Countdown;
pub use hold::HoldTimer;
pub use sets::{SetEvent, SetRestTimer, SetState};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::exercises::Exercise;
use crate::schedule::Capability;

/// Tick period of the scheduler
pub const TICK: Duration = Duration::from_secs(1);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimerError {
    #[error("set {index} cannot be tapped now (next: {next:?})")]
    SetNotTappable { index: u32, next: Option<u32> },

    #[error("no {kind:?} timer for exercise {exercise_id}")]
    NoTimer { exercise_id: String, kind: TimerKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    SetRest,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEventKind {
    RestOver { sets_done: u32 },
    /// The exercise should now be marked completed
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent {
    pub exercise_id: String,
    pub source: TimerKind,
    pub kind: TimerEventKind,
}

struct Registered<T> {
    timer: T,
    capability: Capability,
}

/// Owns the per-exercise timers; one of each kind per exercise
#[derive(Default)]
pub struct TimerService {
    sets: BTreeMap<String, Registered<SetRestTimer>>,
    holds: BTreeMap<String, Registered<HoldTimer>>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the set/rest timer of an exercise
    pub fn track_sets(&mut self, exercise: &Exercise, capability: Capability) {
        self.sets.insert(
            exercise.id.clone(),
            Registered {
                timer: SetRestTimer::new(exercise.total_sets()),
                capability,
            },
        );
    }

    /// Register (or replace) the hold timer; returns false when the
    /// exercise has no usable time-spec
    pub fn track_hold(&mut self, exercise: &Exercise, capability: Capability) -> bool {
        let timer = HoldTimer::from_time_spec(&exercise.time);
        if !timer.has_timer() {
            return false;
        }
        self.holds
            .insert(exercise.id.clone(), Registered { timer, capability });
        true
    }

    /// Drop every timer of an exercise (view closed, exercise deleted)
    pub fn forget(&mut self, exercise_id: &str) {
        self.sets.remove(exercise_id);
        self.holds.remove(exercise_id);
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.holds.is_empty()
    }

    /// True while some countdown is running (a rest or an unpaused hold)
    pub fn is_active(&self) -> bool {
        self.sets
            .values()
            .any(|r| matches!(r.timer.state(), SetState::Resting { .. }))
            || self.holds.values().any(|r| r.timer.is_running())
    }

    pub fn tap_set(&mut self, exercise_id: &str, index: u32, rest_seconds: u32) -> Result<SetState, TimerError> {
        let entry = self
            .sets
            .get_mut(exercise_id)
            .ok_or_else(|| no_timer(exercise_id, TimerKind::SetRest))?;
        entry.timer.tap_set(index, rest_seconds)
    }

    pub fn sets(&self, exercise_id: &str) -> Option<&SetRestTimer> {
        self.sets.get(exercise_id).map(|r| &r.timer)
    }

    pub fn hold(&self, exercise_id: &str) -> Option<&HoldTimer> {
        self.holds.get(exercise_id).map(|r| &r.timer)
    }

    pub fn hold_mut(&mut self, exercise_id: &str) -> Result<&mut HoldTimer, TimerError> {
        self.holds
            .get_mut(exercise_id)
            .map(|r| &mut r.timer)
            .ok_or_else(|| no_timer(exercise_id, TimerKind::Hold))
    }

    /// Advance every timer by one second.
    ///
    /// Completion of read-only exercises is swallowed: those views may show
    /// a countdown but never write.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        let mut events = Vec::new();

        for (id, entry) in self.sets.iter_mut() {
            let kind = match entry.timer.tick() {
                Some(SetEvent::RestOver { sets_done }) => TimerEventKind::RestOver { sets_done },
                Some(SetEvent::Completed) if entry.capability.is_editable() => TimerEventKind::Completed,
                _ => continue,
            };
            events.push(TimerEvent {
                exercise_id: id.clone(),
                source: TimerKind::SetRest,
                kind,
            });
        }

        for (id, entry) in self.holds.iter_mut() {
            if entry.timer.tick() && entry.capability.is_editable() {
                events.push(TimerEvent {
                    exercise_id: id.clone(),
                    source: TimerKind::Hold,
                    kind: TimerEventKind::Completed,
                });
            }
        }

        events
    }
}

fn no_timer(exercise_id: &str, kind: TimerKind) -> TimerError {
    TimerError::NoTimer {
        exercise_id: exercise_id.to_string(),
        kind,
    }
}

/// Running tick task; dropping the handle stops it
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Tick `service` every `period` and forward each tick's events to `events`.
///
/// A batch is sent only for ticks that advanced a running countdown or
/// produced events, so nothing queues up while every timer is idle or
/// paused. The task ends when the handle is dropped or the receiver goes
/// away.
pub fn spawn_ticker(
    service: Arc<Mutex<TimerService>>,
    period: Duration,
    events: mpsc::UnboundedSender<Vec<TimerEvent>>,
) -> TickerHandle {
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick fires immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let batch = {
                let mut service = service.lock().await;
                let active = service.is_active();
                let batch = service.tick();
                if batch.is_empty() && !active {
                    continue;
                }
                batch
            };
            if events.send(batch).is_err() {
                debug!("Ticker receiver gone, stopping");
                break;
            }
        }
    });

    TickerHandle { task }
}
