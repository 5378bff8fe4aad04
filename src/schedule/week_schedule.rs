//! Current-week schedule: the seven live day records

use chrono::NaiveDate;
use tracing::{error, info};

use super::{
    Capability, ExerciseEdit, SyncReport, catalog, decode_days, save_date_record,
    update_day_exercises,
};
use crate::db::{Collection, DocumentStore, Subscription};
use crate::error::ScheduleError;
use crate::exercises::{Day, DayName, Exercise, NewExercise};
use crate::week::date_for_weekday;

/// Live view over `workout_days`, ordered by weekday
pub struct WeekSchedule<'a> {
    store: &'a dyn DocumentStore,
    subscription: Option<Subscription>,
    days: Vec<Day>,
    capability: Capability,
}

impl<'a> WeekSchedule<'a> {
    /// Subscribe to the day records. A failed subscription is logged and
    /// leaves the schedule empty.
    pub fn open(store: &'a dyn DocumentStore, capability: Capability) -> Self {
        let (subscription, days) = match store.subscribe(Collection::WorkoutDays, "order") {
            Ok(mut sub) => {
                let days = decode_days(sub.snapshot());
                (Some(sub), days)
            }
            Err(e) => {
                error!("Failed to load workout days: {}", e);
                (None, Vec::new())
            }
        };

        Self {
            store,
            subscription,
            days,
            capability,
        }
    }

    /// Pull the latest snapshot if the store changed. Returns true on change.
    pub fn refresh(&mut self) -> bool {
        match self.subscription.as_mut().and_then(Subscription::take_if_changed) {
            Some(docs) => {
                self.days = decode_days(docs);
                true
            }
            None => false,
        }
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn day(&self, name: DayName) -> Option<&Day> {
        self.days.iter().find(|d| d.name == name)
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn find_exercise(&self, name: DayName, exercise_id: &str) -> Option<&Exercise> {
        self.day(name)?.exercises.iter().find(|e| e.id == exercise_id)
    }

    pub fn toggle_complete(
        &mut self,
        day: DayName,
        exercise_id: &str,
        today: NaiveDate,
    ) -> Result<SyncReport, ScheduleError> {
        self.commit(day, ExerciseEdit::Toggle(exercise_id.to_string()), today)
    }

    /// Idempotent completion, used when a timer runs out
    pub fn mark_completed(
        &mut self,
        day: DayName,
        exercise_id: &str,
        today: NaiveDate,
    ) -> Result<SyncReport, ScheduleError> {
        self.commit(day, ExerciseEdit::MarkCompleted(exercise_id.to_string()), today)
    }

    /// Validate, assign an id and append. The name also goes to the catalog.
    pub fn add_exercise(
        &mut self,
        day: DayName,
        new: NewExercise,
        today: NaiveDate,
    ) -> Result<(Exercise, SyncReport), ScheduleError> {
        self.capability.ensure_editable()?;
        let exercise = new.into_exercise()?;

        let mut report = self.commit(day, ExerciseEdit::Add(exercise.clone()), today)?;
        report.record("exercise catalog", catalog::remember(self.store, &exercise.name));
        info!("Added {} to {}", exercise.name, day);
        Ok((exercise, report))
    }

    pub fn delete_exercise(
        &mut self,
        day: DayName,
        exercise_id: &str,
        today: NaiveDate,
    ) -> Result<SyncReport, ScheduleError> {
        self.commit(day, ExerciseEdit::Delete(exercise_id.to_string()), today)
    }

    /// Apply the edit in memory, then write the day record and this week's
    /// date record for that weekday. Failed writes are reported, not undone.
    fn commit(&mut self, name: DayName, edit: ExerciseEdit, today: NaiveDate) -> Result<SyncReport, ScheduleError> {
        self.capability.ensure_editable()?;

        let day = self
            .days
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or(ScheduleError::DayNotFound(name))?;

        let updated = edit.apply(&day.exercises)?;
        let mut report = SyncReport::default();
        if updated == day.exercises {
            return Ok(report);
        }
        day.exercises = updated;

        report.record(
            &format!("day {}", name),
            update_day_exercises(self.store, name, &day.exercises),
        );

        let date = date_for_weekday(today, name);
        report.record(
            &format!("date {}", date),
            save_date_record(self.store, date, &day.exercises),
        );

        Ok(report)
    }
}
