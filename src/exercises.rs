//! Schedule records - exercises, weekdays, day and date documents

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Weekday labels, indexed from Sunday like the stored `order` field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayName {
    #[serde(rename = "Domingo")]
    Domingo,
    #[serde(rename = "Segunda-feira")]
    Segunda,
    #[serde(rename = "Terça-feira")]
    Terca,
    #[serde(rename = "Quarta-feira")]
    Quarta,
    #[serde(rename = "Quinta-feira")]
    Quinta,
    #[serde(rename = "Sexta-feira")]
    Sexta,
    #[serde(rename = "Sábado")]
    Sabado,
}

impl DayName {
    pub fn label(&self) -> &'static str {
        match self {
            DayName::Domingo => "Domingo",
            DayName::Segunda => "Segunda-feira",
            DayName::Terca => "Terça-feira",
            DayName::Quarta => "Quarta-feira",
            DayName::Quinta => "Quinta-feira",
            DayName::Sexta => "Sexta-feira",
            DayName::Sabado => "Sábado",
        }
    }

    /// Three-letter label for compact calendar columns
    pub fn short(&self) -> String {
        self.label().chars().take(3).collect()
    }

    /// 0 = Sunday .. 6 = Saturday
    pub fn index(&self) -> u32 {
        match self {
            DayName::Domingo => 0,
            DayName::Segunda => 1,
            DayName::Terca => 2,
            DayName::Quarta => 3,
            DayName::Quinta => 4,
            DayName::Sexta => 5,
            DayName::Sabado => 6,
        }
    }

    pub fn from_index(index: u32) -> Option<DayName> {
        Self::all().get(index as usize).copied()
    }

    /// All weekdays in schedule order
    pub fn all() -> &'static [DayName] {
        &[
            DayName::Domingo,
            DayName::Segunda,
            DayName::Terca,
            DayName::Quarta,
            DayName::Quinta,
            DayName::Sexta,
            DayName::Sabado,
        ]
    }
}

impl fmt::Display for DayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown weekday: {0}")]
pub struct UnknownDay(pub String);

impl FromStr for DayName {
    type Err = UnknownDay;

    /// Accepts the full label, its ASCII spelling ("Terca-feira", "Sabado"),
    /// a three-letter prefix, or the 0-6 index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold(s.trim());
        if wanted.is_empty() {
            return Err(UnknownDay(s.to_string()));
        }
        if let Ok(index) = wanted.parse::<u32>() {
            return DayName::from_index(index).ok_or_else(|| UnknownDay(s.to_string()));
        }

        DayName::all()
            .iter()
            .copied()
            .find(|day| {
                let label = fold(day.label());
                label == wanted || (wanted.len() >= 3 && label.starts_with(&wanted))
            })
            .ok_or_else(|| UnknownDay(s.to_string()))
    }
}

/// Lowercase and drop the accents used in weekday labels
fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'ç' => 'c',
            'á' | 'ã' | 'â' => 'a',
            'é' | 'ê' => 'e',
            other => other,
        })
        .collect()
}

fn default_count() -> u32 {
    1
}

/// One exercise entry inside a Day or a DateRecord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default = "default_count")]
    pub sets: u32,
    #[serde(default = "default_count")]
    pub reps: u32,
    /// Time-spec for isometric holds ("30s"), may be empty
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub completed: bool,
}

impl Exercise {
    /// Sets to perform; a stored 0 counts as a single set
    pub fn total_sets(&self) -> u32 {
        self.sets.max(1)
    }
}

/// User input for a new exercise, before it gets an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub time: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidExercise {
    #[error("exercise name is empty")]
    EmptyName,
    #[error("sets must be at least 1")]
    NoSets,
    #[error("reps must be at least 1")]
    NoReps,
}

impl NewExercise {
    pub fn new(name: impl Into<String>, sets: u32, reps: u32, time: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sets,
            reps,
            time: time.into(),
        }
    }

    /// Validate and turn into a stored exercise with a fresh id
    pub fn into_exercise(self) -> Result<Exercise, InvalidExercise> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(InvalidExercise::EmptyName);
        }
        if self.sets == 0 {
            return Err(InvalidExercise::NoSets);
        }
        if self.reps == 0 {
            return Err(InvalidExercise::NoReps);
        }

        Ok(Exercise {
            id: new_exercise_id(),
            name: name.to_string(),
            sets: self.sets,
            reps: self.reps,
            time: self.time.trim().to_string(),
            completed: false,
        })
    }
}

/// Random 128-bit id, hex encoded
pub fn new_exercise_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Live weekly slot for one weekday (`workout_days` collection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub name: DayName,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    pub order: u32,
}

impl Day {
    pub fn empty(name: DayName) -> Self {
        Self {
            name,
            exercises: Vec::new(),
            order: name.index(),
        }
    }

    pub fn with_exercises(name: DayName, exercises: Vec<Exercise>) -> Self {
        Self {
            name,
            exercises,
            order: name.index(),
        }
    }

    /// Completed share in percent, 0 for a rest day
    pub fn progress(&self) -> f32 {
        progress(&self.exercises)
    }

    pub fn is_rest_day(&self) -> bool {
        self.exercises.is_empty()
    }
}

/// Exercises stored for one calendar date (`exercises_by_date` collection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRecord {
    /// YYYY-MM-DD
    pub date: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// One column of the calendar view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayByDate {
    pub date: chrono::NaiveDate,
    pub day_name: DayName,
    pub exercises: Vec<Exercise>,
}

impl DayByDate {
    pub fn progress(&self) -> f32 {
        progress(&self.exercises)
    }
}

fn progress(exercises: &[Exercise]) -> f32 {
    if exercises.is_empty() {
        return 0.0;
    }
    let done = exercises.iter().filter(|e| e.completed).count();
    done as f32 / exercises.len() as f32 * 100.0
}

/// Entry in the global `exercises` catalog used for suggestions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
}
