//! treino - Personal weekly workout schedule
//!
//! Seven live weekdays, a per-date calendar history, weekly completion reset
//! and set/rest timers over a small document store.

pub mod config;
pub mod db;
pub mod error;
pub mod exercises;
pub mod schedule;
pub mod settings;
pub mod timer;
pub mod timespec;
pub mod week;

pub use db::{Database, DocumentStore, MemoryStore};
pub use error::{ScheduleError, StoreError};
pub use schedule::{CalendarNavigator, Capability, WeekSchedule};
