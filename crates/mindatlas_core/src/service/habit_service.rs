//! Habit use-case service.
//!
//! # Invariants
//! - Toggling a day twice restores the original completion set.
//! - Streaks are computed at read time relative to the caller's `today`.

use crate::habit::streak::calculate_streak;
use crate::model::habit::{Habit, HabitId, HabitValidationError};
use crate::model::insight::DetectedPattern;
use crate::repo::artifact_repo::RepoError;
use crate::repo::habit_repo::HabitRepository;
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum HabitServiceError {
    Validation(HabitValidationError),
    NotFound(HabitId),
    /// The pattern carried no suggested habit to adopt.
    NoSuggestedHabit,
    Store(RepoError),
}

impl Display for HabitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::NoSuggestedHabit => write!(f, "pattern has no suggested habit"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HabitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for HabitServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::HabitValidation(err) => Self::Validation(err),
            RepoError::HabitNotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// A habit with its current streak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitWithStreak {
    pub habit: Habit,
    pub streak: u32,
}

/// Habit service facade over repository implementations.
pub struct HabitService<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_habit(&self, description: &str) -> Result<Habit, HabitServiceError> {
        let habit = Habit::new(description.trim());
        habit.validate().map_err(HabitServiceError::Validation)?;
        let stored = self.repo.create_habit(&habit)?;
        info!(
            "event=habit_create module=service status=ok habit_id={}",
            stored.id
        );
        Ok(stored)
    }

    /// Adopts the habit a detected pattern suggested.
    pub fn habit_from_pattern(
        &self,
        pattern: &DetectedPattern,
    ) -> Result<Habit, HabitServiceError> {
        let description = pattern
            .suggested_habit
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .ok_or(HabitServiceError::NoSuggestedHabit)?;
        self.create_habit(description)
    }

    /// Flips completion for `day` and returns whether it is now completed.
    pub fn toggle_completion(&self, id: HabitId, day: NaiveDate) -> Result<bool, HabitServiceError> {
        let habit = self
            .repo
            .get_habit(id)?
            .ok_or(HabitServiceError::NotFound(id))?;
        let completed = !habit.is_completed_on(day);
        self.repo.set_completion(id, day, completed)?;
        Ok(completed)
    }

    /// Every habit, newest first, with the streak ending at `today`.
    pub fn list_habits(&self, today: NaiveDate) -> Result<Vec<HabitWithStreak>, HabitServiceError> {
        Ok(self
            .repo
            .list_habits()?
            .into_iter()
            .map(|habit| {
                let streak = calculate_streak(&habit.completed_dates, today);
                HabitWithStreak { habit, streak }
            })
            .collect())
    }

    pub fn delete_habit(&self, id: HabitId) -> Result<(), HabitServiceError> {
        self.repo.delete_habit(id)?;
        info!(
            "event=habit_delete module=service status=ok habit_id={}",
            id
        );
        Ok(())
    }
}
