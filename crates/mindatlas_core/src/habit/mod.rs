//! Habit tracking logic that is independent of storage.

pub mod streak;
