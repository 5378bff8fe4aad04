use thiserror::Error;

use crate::exercises::{DayName, InvalidExercise};

/// Failures of the document store or local storage
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("read from {collection} failed: {reason}")]
    Read {
        collection: &'static str,
        reason: String,
    },

    #[error("write to {collection}/{key} failed: {reason}")]
    Write {
        collection: &'static str,
        key: String,
        reason: String,
    },

    #[error("document not found: {collection}/{key}")]
    NotFound { collection: &'static str, key: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected schedule operations
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("this view is read-only")]
    ReadOnly,

    #[error("day not loaded: {0}")]
    DayNotFound(DayName),

    #[error("exercise not found: {0}")]
    ExerciseNotFound(String),

    #[error("invalid exercise: {0}")]
    InvalidExercise(#[from] InvalidExercise),

    #[error(transparent)]
    Store(#[from] StoreError),
}
