//! Weekly reset of completion flags
//!
//! At session start the ISO week of today is compared with the watermark in
//! local storage. A new week clears `completed` on every exercise of every
//! day. The watermark only moves once every day was written; a failed day
//! means the whole reset runs again at the next start.

use chrono::NaiveDate;
use tracing::{error, info};

use super::{decode_days, update_day_exercises};
use crate::db::{Collection, DocumentStore};
use crate::error::StoreError;
use crate::exercises::DayName;
use crate::settings::{self, KeyValueStore};
use crate::week::iso_week_string;

#[derive(Debug)]
pub struct ReconcileOutcome {
    /// Watermark to keep (unchanged unless the reset fully succeeded)
    pub watermark: Option<String>,
    /// A reset was attempted for a new week
    pub reset_performed: bool,
    /// Days that could not be written, or the scan failure (`None`)
    pub failures: Vec<(Option<DayName>, StoreError)>,
}

impl ReconcileOutcome {
    pub fn advanced(&self, previous: Option<&str>) -> bool {
        self.watermark.as_deref() != previous
    }
}

pub fn reconcile(now: NaiveDate, watermark: Option<&str>, store: &dyn DocumentStore) -> ReconcileOutcome {
    let current_week = iso_week_string(now);
    let unchanged = |failures| ReconcileOutcome {
        watermark: watermark.map(str::to_string),
        reset_performed: false,
        failures,
    };

    if watermark == Some(current_week.as_str()) {
        return unchanged(Vec::new());
    }

    let docs = match store.get_all(Collection::WorkoutDays) {
        Ok(docs) => docs,
        Err(e) => {
            error!("Weekly reset could not read days: {}", e);
            return unchanged(vec![(None, e)]);
        }
    };

    info!(
        "New week {} (last reset {}), clearing completed exercises",
        current_week,
        watermark.unwrap_or("never")
    );

    let mut failures = Vec::new();
    for day in decode_days(docs) {
        if day.exercises.is_empty() {
            continue;
        }
        let cleared: Vec<_> = day
            .exercises
            .into_iter()
            .map(|mut ex| {
                ex.completed = false;
                ex
            })
            .collect();

        if let Err(e) = update_day_exercises(store, day.name, &cleared) {
            error!("Weekly reset failed for {}: {}", day.name, e);
            failures.push((Some(day.name), e));
        }
    }

    let watermark = if failures.is_empty() {
        Some(current_week)
    } else {
        watermark.map(str::to_string)
    };

    ReconcileOutcome {
        watermark,
        reset_performed: true,
        failures,
    }
}

/// Reconcile against the watermark kept in local storage and persist the new one
pub fn run_weekly_reset(
    now: NaiveDate,
    storage: &dyn KeyValueStore,
    store: &dyn DocumentStore,
) -> ReconcileOutcome {
    let previous = settings::last_reset_week(storage);
    let outcome = reconcile(now, previous.as_deref(), store);

    if outcome.advanced(previous.as_deref())
        && let Some(week) = &outcome.watermark
        && let Err(e) = settings::set_last_reset_week(storage, week)
    {
        error!("Failed to store reset watermark {}: {}", week, e);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::exercises::{Day, NewExercise};
    use crate::schedule::{bootstrap, save_day};
    use crate::settings::MemoryStorage;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
    }

    fn seed(store: &MemoryStore) {
        bootstrap(store).unwrap();
        for name in [DayName::Segunda, DayName::Quarta] {
            let mut ex = NewExercise::new("Squat", 3, 10, "").into_exercise().unwrap();
            ex.completed = true;
            save_day(store, &Day::with_exercises(name, vec![ex])).unwrap();
        }
    }

    fn completed_count(store: &MemoryStore) -> usize {
        decode_days(store.get_all(Collection::WorkoutDays).unwrap())
            .iter()
            .flat_map(|d| d.exercises.iter())
            .filter(|e| e.completed)
            .count()
    }

    #[test]
    fn test_new_week_clears_completed() {
        let store = MemoryStore::new();
        seed(&store);
        assert_eq!(completed_count(&store), 2);

        let before = store.write_count();
        let outcome = reconcile(today(), Some("2023-W52"), &store);
        assert!(outcome.reset_performed);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.watermark.as_deref(), Some("2024-W01"));
        assert_eq!(completed_count(&store), 0);
        // only the two non-empty days were written
        assert_eq!(store.write_count() - before, 2);
    }

    #[test]
    fn test_same_week_is_noop() {
        let store = MemoryStore::new();
        seed(&store);
        let before = store.write_count();

        let outcome = reconcile(today(), Some("2024-W01"), &store);
        assert!(!outcome.reset_performed);
        assert_eq!(store.write_count(), before);
        assert_eq!(completed_count(&store), 2);
    }

    #[test]
    fn test_second_run_performs_no_writes() {
        let store = MemoryStore::new();
        let storage = MemoryStorage::new();
        seed(&store);

        let first = run_weekly_reset(today(), &storage, &store);
        assert!(first.reset_performed);
        assert_eq!(settings::last_reset_week(&storage).as_deref(), Some("2024-W01"));

        let before = store.write_count();
        let second = run_weekly_reset(today(), &storage, &store);
        assert!(!second.reset_performed);
        assert_eq!(store.write_count(), before);
    }

    #[test]
    fn test_partial_failure_keeps_watermark() {
        let store = MemoryStore::new();
        let storage = MemoryStorage::new();
        seed(&store);
        store.fail_writes_to(Collection::WorkoutDays, DayName::Segunda.label());

        let outcome = run_weekly_reset(today(), &storage, &store);
        assert!(outcome.reset_performed);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, Some(DayName::Segunda));
        assert_eq!(outcome.watermark, None);
        assert_eq!(settings::last_reset_week(&storage), None);
        // the other day was still reset
        assert_eq!(completed_count(&store), 1);

        store.clear_failures();
        let retry = run_weekly_reset(today(), &storage, &store);
        assert!(retry.failures.is_empty());
        assert_eq!(completed_count(&store), 0);
        assert_eq!(settings::last_reset_week(&storage).as_deref(), Some("2024-W01"));
    }

    #[test]
    fn test_read_failure_reported() {
        let store = MemoryStore::new();
        store.fail_reads();
        let outcome = reconcile(today(), None, &store);
        assert!(!outcome.reset_performed);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].0.is_none());
    }
}
