//! Weekly schedule - current-week days, per-date history and their sync rules
//!
//! Two collections hold the same kind of data: `workout_days` (one record per
//! weekday, reused every week) and `exercises_by_date` (one record per
//! calendar date). Edits made for a date inside the live week are written to
//! both; anything outside the live week only touches its date record.

pub mod calendar;
pub mod catalog;
pub mod reconcile;
pub mod week_schedule;

pub use calendar::CalendarNavigator;
pub use reconcile::{ReconcileOutcome, reconcile, run_weekly_reset};
pub use week_schedule::WeekSchedule;

use chrono::NaiveDate;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::db::{Collection, DocumentStore};
use crate::error::{ScheduleError, StoreError};
use crate::exercises::{DateRecord, Day, DayName, Exercise};
use crate::settings::KeyValueStore;
use crate::week::format_date;

/// Which operations a view exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    #[default]
    Editable,
    ReadOnly,
}

impl Capability {
    pub fn is_editable(&self) -> bool {
        matches!(self, Capability::Editable)
    }

    pub(crate) fn ensure_editable(&self) -> Result<(), ScheduleError> {
        match self {
            Capability::Editable => Ok(()),
            Capability::ReadOnly => Err(ScheduleError::ReadOnly),
        }
    }
}

/// One change to an exercise list
#[derive(Debug, Clone)]
pub enum ExerciseEdit {
    Toggle(String),
    /// Set `completed` without flipping it back; used by timers
    MarkCompleted(String),
    Add(Exercise),
    Delete(String),
}

impl ExerciseEdit {
    /// The list after the edit. Unknown ids are an error.
    pub fn apply(&self, exercises: &[Exercise]) -> Result<Vec<Exercise>, ScheduleError> {
        let mut updated = exercises.to_vec();
        match self {
            ExerciseEdit::Toggle(id) => {
                let ex = find_mut(&mut updated, id)?;
                ex.completed = !ex.completed;
            }
            ExerciseEdit::MarkCompleted(id) => {
                find_mut(&mut updated, id)?.completed = true;
            }
            ExerciseEdit::Add(exercise) => updated.push(exercise.clone()),
            ExerciseEdit::Delete(id) => {
                let before = updated.len();
                updated.retain(|e| &e.id != id);
                if updated.len() == before {
                    return Err(ScheduleError::ExerciseNotFound(id.clone()));
                }
            }
        }
        Ok(updated)
    }
}

fn find_mut<'a>(exercises: &'a mut [Exercise], id: &str) -> Result<&'a mut Exercise, ScheduleError> {
    exercises
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| ScheduleError::ExerciseNotFound(id.to_string()))
}

/// Store writes that failed while applying an edit. The in-memory state keeps
/// the edit either way; the views converge on the next successful read.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub failures: Vec<StoreError>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record(&mut self, what: &str, result: Result<(), StoreError>) {
        if let Err(e) = result {
            error!("Failed to save {}: {}", what, e);
            self.failures.push(e);
        }
    }
}

/// Decode day records, skipping malformed documents
pub(crate) fn decode_days(docs: Vec<Value>) -> Vec<Day> {
    docs.into_iter()
        .filter_map(|doc| match serde_json::from_value::<Day>(doc) {
            Ok(day) => Some(day),
            Err(e) => {
                warn!("Skipping malformed day record: {}", e);
                None
            }
        })
        .collect()
}

/// Replace a day's exercise list, keeping its other fields
pub(crate) fn update_day_exercises(
    store: &dyn DocumentStore,
    day: DayName,
    exercises: &[Exercise],
) -> Result<(), StoreError> {
    let exercises = serde_json::to_value(exercises)?;
    store.update_fields(
        Collection::WorkoutDays,
        day.label(),
        &json!({ "exercises": exercises }),
    )
}

/// Full replace of a day record
pub(crate) fn save_day(store: &dyn DocumentStore, day: &Day) -> Result<(), StoreError> {
    store.set_record(Collection::WorkoutDays, day.name.label(), &serde_json::to_value(day)?)
}

pub(crate) fn save_date_record(
    store: &dyn DocumentStore,
    date: NaiveDate,
    exercises: &[Exercise],
) -> Result<(), StoreError> {
    let record = DateRecord {
        date: format_date(date),
        exercises: exercises.to_vec(),
    };
    store.set_record(
        Collection::ExercisesByDate,
        &record.date,
        &serde_json::to_value(&record)?,
    )
}

/// Exercises stored for `date`; no record means an empty list
pub fn load_date_exercises(store: &dyn DocumentStore, date: NaiveDate) -> Result<Vec<Exercise>, StoreError> {
    match store.get_one(Collection::ExercisesByDate, &format_date(date))? {
        Some(doc) => Ok(serde_json::from_value::<DateRecord>(doc)?.exercises),
        None => Ok(Vec::new()),
    }
}

/// Create the seven day records on first run. Returns true when it did.
pub fn bootstrap(store: &dyn DocumentStore) -> Result<bool, StoreError> {
    if !store.get_all(Collection::WorkoutDays)?.is_empty() {
        return Ok(false);
    }

    info!("Initializing database with default days");
    let records = DayName::all()
        .iter()
        .map(|name| -> Result<(String, Value), StoreError> {
            let day = Day::empty(*name);
            Ok((name.label().to_string(), serde_json::to_value(&day)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    store.batch_set(Collection::WorkoutDays, &records)?;
    Ok(true)
}

/// What happened while opening a session
#[derive(Debug)]
pub struct StartupReport {
    pub bootstrapped: bool,
    pub reset: ReconcileOutcome,
}

/// Session start: create missing days, then run the weekly reset once
pub fn start_session(
    store: &dyn DocumentStore,
    storage: &dyn KeyValueStore,
    today: NaiveDate,
) -> StartupReport {
    let bootstrapped = bootstrap(store).unwrap_or_else(|e| {
        error!("Failed to initialize workout days: {}", e);
        false
    });
    let reset = run_weekly_reset(today, storage, store);
    StartupReport { bootstrapped, reset }
}
