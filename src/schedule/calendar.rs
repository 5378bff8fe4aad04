//! Calendar navigation over `exercises_by_date`

use chrono::{Duration, NaiveDate};
use tracing::{error, info, warn};

use super::{Capability, ExerciseEdit, SyncReport, catalog, load_date_exercises, save_date_record, save_day};
use crate::db::DocumentStore;
use crate::error::ScheduleError;
use crate::exercises::{Day, DayByDate, Exercise, NewExercise};
use crate::week::{self, day_name_of, format_display, week_dates};

/// A displayed Sunday-start week and its seven date records
pub struct CalendarNavigator<'a> {
    store: &'a dyn DocumentStore,
    today: NaiveDate,
    week_start: NaiveDate,
    capability: Capability,
    week: Vec<DayByDate>,
}

impl<'a> CalendarNavigator<'a> {
    /// Start on the week containing `today`
    pub fn new(store: &'a dyn DocumentStore, today: NaiveDate, capability: Capability) -> Self {
        Self {
            store,
            today,
            week_start: week::week_start(today),
            capability,
            week: Vec::new(),
        }
    }

    /// Jump to the week containing `date`
    pub fn show_week_of(&mut self, date: NaiveDate) {
        self.week_start = week::week_start(date);
        self.week.clear();
    }

    pub fn prev_week(&mut self) {
        self.show_week_of(self.week_start - Duration::days(7));
    }

    pub fn next_week(&mut self) {
        self.show_week_of(self.week_start + Duration::days(7));
    }

    /// Move by whole weeks, negative goes back
    pub fn shift_weeks(&mut self, offset: i64) {
        self.show_week_of(self.week_start + Duration::weeks(offset));
    }

    pub fn go_to_current_week(&mut self) {
        self.show_week_of(self.today);
    }

    pub fn is_current_week(&self) -> bool {
        week::is_in_current_week(self.week_start, self.today)
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn week_end(&self) -> NaiveDate {
        self.week_start + Duration::days(6)
    }

    /// "dd/mm/yyyy - dd/mm/yyyy"
    pub fn range_label(&self) -> String {
        format!(
            "{} - {}",
            format_display(self.week_start),
            format_display(self.week_end())
        )
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Fetch the seven date records of the displayed week. A date that fails
    /// to load shows as empty. The columns are a display copy; edits re-read
    /// the date from the store first.
    pub fn load_week(&mut self) -> &[DayByDate] {
        self.week = week_dates(self.week_start)
            .into_iter()
            .map(|(date, day_name)| {
                let exercises = load_date_exercises(self.store, date).unwrap_or_else(|e| {
                    error!("Failed to load exercises for {}: {}", date, e);
                    Vec::new()
                });
                DayByDate {
                    date,
                    day_name,
                    exercises,
                }
            })
            .collect();
        &self.week
    }

    pub fn week(&self) -> &[DayByDate] {
        &self.week
    }

    pub fn column(&self, date: NaiveDate) -> Option<&DayByDate> {
        self.week.iter().find(|d| d.date == date)
    }

    /// True when edits on `date` must also land in the live day record
    pub fn mirrors_to_day(&self, date: NaiveDate) -> bool {
        week::is_in_current_week(date, self.today)
    }

    pub fn toggle_complete(&mut self, date: NaiveDate, exercise_id: &str) -> Result<SyncReport, ScheduleError> {
        self.commit(date, ExerciseEdit::Toggle(exercise_id.to_string()))
    }

    pub fn mark_completed(&mut self, date: NaiveDate, exercise_id: &str) -> Result<SyncReport, ScheduleError> {
        self.commit(date, ExerciseEdit::MarkCompleted(exercise_id.to_string()))
    }

    pub fn add_exercise(
        &mut self,
        date: NaiveDate,
        new: NewExercise,
    ) -> Result<(Exercise, SyncReport), ScheduleError> {
        self.capability.ensure_editable()?;
        let exercise = new.into_exercise()?;

        let mut report = self.commit(date, ExerciseEdit::Add(exercise.clone()))?;
        report.record("exercise catalog", catalog::remember(self.store, &exercise.name));
        info!("Added {} on {}", exercise.name, date);
        Ok((exercise, report))
    }

    pub fn delete_exercise(&mut self, date: NaiveDate, exercise_id: &str) -> Result<SyncReport, ScheduleError> {
        self.commit(date, ExerciseEdit::Delete(exercise_id.to_string()))
    }

    /// Apply `edit` to the stored list of `date` and write the date record;
    /// inside the live week also overwrite the day record with the same list.
    /// When the store can't be read, the loaded column is edited instead.
    fn commit(&mut self, date: NaiveDate, edit: ExerciseEdit) -> Result<SyncReport, ScheduleError> {
        self.capability.ensure_editable()?;

        let current = match (load_date_exercises(self.store, date), self.column(date)) {
            (Ok(stored), _) => stored,
            (Err(e), Some(column)) => {
                warn!("Failed to re-read {}, editing the loaded copy: {}", date, e);
                column.exercises.clone()
            }
            (Err(e), None) => return Err(e.into()),
        };
        let updated = edit.apply(&current)?;

        if let Some(column) = self.week.iter_mut().find(|d| d.date == date) {
            column.exercises = updated.clone();
        }

        let mut report = SyncReport::default();
        if updated == current {
            return Ok(report);
        }

        report.record(
            &format!("date {}", date),
            save_date_record(self.store, date, &updated),
        );

        if self.mirrors_to_day(date) {
            let day = Day::with_exercises(day_name_of(date), updated);
            report.record(&format!("day {}", day.name), save_day(self.store, &day));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Collection, MemoryStore};
    use crate::exercises::DayName;
    use crate::schedule::{WeekSchedule, bootstrap, decode_days};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2024, 1, 3)
    }

    fn day_record(store: &MemoryStore, name: DayName) -> Day {
        decode_days(store.get_all(Collection::WorkoutDays).unwrap())
            .into_iter()
            .find(|d| d.name == name)
            .unwrap()
    }

    #[test]
    fn test_navigation() {
        let store = MemoryStore::new();
        let mut cal = CalendarNavigator::new(&store, today(), Capability::Editable);
        assert_eq!(cal.week_start(), ymd(2023, 12, 31));
        assert!(cal.is_current_week());
        assert_eq!(cal.range_label(), "31/12/2023 - 06/01/2024");

        cal.next_week();
        assert_eq!(cal.week_start(), ymd(2024, 1, 7));
        assert!(!cal.is_current_week());

        cal.shift_weeks(-3);
        assert_eq!(cal.week_start(), ymd(2023, 12, 17));

        cal.go_to_current_week();
        assert!(cal.is_current_week());
        cal.prev_week();
        assert_eq!(cal.week_end(), ymd(2023, 12, 30));
    }

    #[test]
    fn test_load_week_pairs() {
        let store = MemoryStore::new();
        let mut cal = CalendarNavigator::new(&store, today(), Capability::Editable);
        let week = cal.load_week();
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].day_name, DayName::Domingo);
        assert_eq!(week[1].date, ymd(2024, 1, 1));
        assert!(week.iter().all(|d| d.exercises.is_empty()));
    }

    #[test]
    fn test_edit_in_live_week_updates_day() {
        let store = MemoryStore::new();
        bootstrap(&store).unwrap();
        let mut cal = CalendarNavigator::new(&store, today(), Capability::Editable);
        cal.load_week();

        let monday = ymd(2024, 1, 1);
        assert!(cal.mirrors_to_day(monday));
        let (ex, report) = cal
            .add_exercise(monday, NewExercise::new("Squat", 3, 10, ""))
            .unwrap();
        assert!(report.is_clean());

        let day = day_record(&store, DayName::Segunda);
        assert_eq!(day.exercises, vec![ex.clone()]);
        assert_eq!(day.order, 1);
        assert_eq!(load_date_exercises(&store, monday).unwrap(), vec![ex.clone()]);
        assert_eq!(cal.column(monday).unwrap().exercises, vec![ex.clone()]);

        cal.toggle_complete(monday, &ex.id).unwrap();
        assert!(day_record(&store, DayName::Segunda).exercises[0].completed);
        assert_eq!(
            day_record(&store, DayName::Segunda).exercises,
            load_date_exercises(&store, monday).unwrap()
        );
    }

    #[test]
    fn test_edit_in_other_week_leaves_day() {
        let store = MemoryStore::new();
        bootstrap(&store).unwrap();
        let mut cal = CalendarNavigator::new(&store, today(), Capability::Editable);
        cal.next_week();
        cal.load_week();

        let next_monday = ymd(2024, 1, 8);
        assert!(!cal.mirrors_to_day(next_monday));
        let (ex, _) = cal
            .add_exercise(next_monday, NewExercise::new("Squat", 3, 10, ""))
            .unwrap();

        assert!(day_record(&store, DayName::Segunda).exercises.is_empty());
        assert_eq!(load_date_exercises(&store, next_monday).unwrap(), vec![ex.clone()]);

        cal.delete_exercise(next_monday, &ex.id).unwrap();
        assert!(load_date_exercises(&store, next_monday).unwrap().is_empty());
        assert!(day_record(&store, DayName::Segunda).exercises.is_empty());
    }

    #[test]
    fn test_edit_keeps_entries_written_after_load() {
        let store = MemoryStore::new();
        bootstrap(&store).unwrap();
        let mut cal = CalendarNavigator::new(&store, today(), Capability::Editable);
        cal.load_week();

        let monday = ymd(2024, 1, 1);
        let mut schedule = WeekSchedule::open(&store, Capability::Editable);
        let (squat, _) = schedule
            .add_exercise(DayName::Segunda, NewExercise::new("Squat", 3, 10, ""), today())
            .unwrap();
        assert!(cal.column(monday).unwrap().exercises.is_empty());

        let (row, report) = cal.add_exercise(monday, NewExercise::new("Row", 2, 8, "")).unwrap();
        assert!(report.is_clean());

        let both = vec![squat.clone(), row.clone()];
        assert_eq!(load_date_exercises(&store, monday).unwrap(), both);
        assert_eq!(day_record(&store, DayName::Segunda).exercises, both);
        assert_eq!(cal.column(monday).unwrap().exercises, both);
    }

    #[test]
    fn test_unreadable_store_edits_loaded_column() {
        let store = MemoryStore::new();
        let mut cal = CalendarNavigator::new(&store, today(), Capability::Editable);
        let saturday = ymd(2024, 1, 6);
        let (ex, _) = cal.add_exercise(saturday, NewExercise::new("Row", 2, 8, "")).unwrap();
        cal.load_week();

        store.fail_reads();
        let report = cal.toggle_complete(saturday, &ex.id).unwrap();
        assert!(report.is_clean());
        assert!(cal.column(saturday).unwrap().exercises[0].completed);

        store.clear_failures();
        assert!(load_date_exercises(&store, saturday).unwrap()[0].completed);

        store.fail_reads();
        let elsewhere = ymd(2023, 6, 1);
        assert!(matches!(
            cal.toggle_complete(elsewhere, &ex.id),
            Err(ScheduleError::Store(_))
        ));
    }

    #[test]
    fn test_edit_outside_displayed_week_reads_store() {
        let store = MemoryStore::new();
        let mut cal = CalendarNavigator::new(&store, today(), Capability::Editable);
        let past = ymd(2023, 6, 1);
        let (ex, _) = cal.add_exercise(past, NewExercise::new("Row", 2, 8, "")).unwrap();
        cal.toggle_complete(past, &ex.id).unwrap();
        assert!(load_date_exercises(&store, past).unwrap()[0].completed);
    }

    #[test]
    fn test_read_only_calendar() {
        let store = MemoryStore::new();
        let mut cal = CalendarNavigator::new(&store, today(), Capability::ReadOnly);
        cal.load_week();
        assert!(matches!(
            cal.add_exercise(today(), NewExercise::new("Squat", 1, 1, "")),
            Err(ScheduleError::ReadOnly)
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_failed_date_load_is_empty() {
        let store = MemoryStore::new();
        store.fail_reads();
        let mut cal = CalendarNavigator::new(&store, today(), Capability::Editable);
        assert!(cal.load_week().iter().all(|d| d.exercises.is_empty()));
    }
}
