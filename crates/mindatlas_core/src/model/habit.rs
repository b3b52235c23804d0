//! Habit domain model.
//!
//! # Responsibility
//! - Define tracked habits and their per-day completion set.
//! - Parse and format the calendar-day wire form (`YYYY-MM-DD`).
//!
//! # Invariants
//! - `description` is non-blank.
//! - Each calendar day appears at most once in `completed_dates`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one habit.
pub type HabitId = Uuid;

const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    EmptyDescription,
    InvalidDay(String),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "habit description must not be blank"),
            Self::InvalidDay(value) => {
                write!(f, "invalid completion day `{value}`; expected YYYY-MM-DD")
            }
        }
    }
}

impl Error for HabitValidationError {}

/// A tracked behavioral pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub description: String,
    pub completed_dates: BTreeSet<NaiveDate>,
    /// Epoch milliseconds, assigned by the store.
    pub created_at: i64,
}

impl Habit {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            completed_dates: BTreeSet::new(),
            created_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.description.trim().is_empty() {
            return Err(HabitValidationError::EmptyDescription);
        }
        Ok(())
    }

    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.completed_dates.contains(&day)
    }
}

/// Parses one `YYYY-MM-DD` completion day.
pub fn parse_completion_day(value: &str) -> Result<NaiveDate, HabitValidationError> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT)
        .map_err(|_| HabitValidationError::InvalidDay(value.to_string()))
}

/// Formats a completion day as `YYYY-MM-DD`.
pub fn format_completion_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}
