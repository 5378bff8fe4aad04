//! Calendar helpers - ISO week labels and Sunday-start weeks

use chrono::{Datelike, Duration, NaiveDate};

use crate::exercises::DayName;

/// Storage format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// ISO-8601 (year, week) pair; only its `YYYY-Www` form is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WeekIdentifier {
    pub year: i32,
    pub week: u32,
}

impl WeekIdentifier {
    pub fn of(date: NaiveDate) -> Self {
        // Thursday decides which year the week belongs to
        let monday_index = date.weekday().num_days_from_monday() as i64;
        let thursday = date + Duration::days(3 - monday_index);

        let week1 = NaiveDate::from_ymd_opt(thursday.year(), 1, 4)
            .unwrap_or(thursday);
        let week1_monday_index = week1.weekday().num_days_from_monday() as i64;

        let offset = (thursday - week1).num_days() - 3 + week1_monday_index;
        let week = 1 + (offset as f64 / 7.0).round() as i64;

        Self {
            year: thursday.year(),
            week: week as u32,
        }
    }
}

impl std::fmt::Display for WeekIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// `YYYY-Www` label used as the weekly reset watermark
pub fn iso_week_string(date: NaiveDate) -> String {
    WeekIdentifier::of(date).to_string()
}

/// Most recent Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// The seven (date, weekday) pairs of the week containing `date`
pub fn week_dates(date: NaiveDate) -> [(NaiveDate, DayName); 7] {
    let start = week_start(date);
    let days = DayName::all();
    std::array::from_fn(|i| (start + Duration::days(i as i64), days[i]))
}

/// Date that `day` falls on in the Sunday-start week containing `today`
pub fn date_for_weekday(today: NaiveDate, day: DayName) -> NaiveDate {
    week_start(today) + Duration::days(day.index() as i64)
}

pub fn day_name_of(date: NaiveDate) -> DayName {
    let days = DayName::all();
    days[date.weekday().num_days_from_sunday() as usize]
}

/// True when `date` is inside the live week of `today`
pub fn is_in_current_week(date: NaiveDate, today: NaiveDate) -> bool {
    week_start(date) == week_start(today)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// dd/mm/yyyy, the display format of the calendar header
pub fn format_display(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
