//! Habit repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist habits and their per-day completion rows.
//!
//! # Invariants
//! - A habit has at most one completion row per calendar day.
//! - Completion rows are removed together with their habit.

use crate::model::habit::{format_completion_day, parse_completion_day, Habit, HabitId};
use crate::repo::artifact_repo::{parse_uuid, RepoError, RepoResult};
use crate::repo::ensure_tables_ready;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

/// Repository interface for habit persistence.
pub trait HabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<Habit>;
    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>>;
    /// Every habit, newest first.
    fn list_habits(&self) -> RepoResult<Vec<Habit>>;
    /// Marks or clears one completion day.
    fn set_completion(&self, id: HabitId, day: NaiveDate, completed: bool) -> RepoResult<()>;
    fn delete_habit(&self, id: HabitId) -> RepoResult<()>;
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables_ready(
            conn,
            &[
                ("habits", &["uuid", "description", "created_at"]),
                ("habit_completions", &["habit_uuid", "day"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<Habit> {
        habit.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id_text = habit.id.to_string();
        tx.execute(
            "INSERT INTO habits (uuid, description) VALUES (?1, ?2);",
            params![id_text, habit.description.as_str()],
        )?;
        for day in &habit.completed_dates {
            tx.execute(
                "INSERT OR IGNORE INTO habit_completions (habit_uuid, day) VALUES (?1, ?2);",
                params![id_text, format_completion_day(*day)],
            )?;
        }
        let stored = load_habit(&tx, habit.id)?
            .ok_or_else(|| RepoError::InvalidData("created habit missing in read-back".into()))?;
        tx.commit()?;

        Ok(stored)
    }

    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>> {
        load_habit(self.conn, id)
    }

    fn list_habits(&self) -> RepoResult<Vec<Habit>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid FROM habits ORDER BY created_at DESC, uuid ASC;")?;
        let mut rows = stmt.query([])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            let id = parse_uuid(&value, "habits.uuid")?;
            if let Some(habit) = load_habit(self.conn, id)? {
                habits.push(habit);
            }
        }
        Ok(habits)
    }

    fn set_completion(&self, id: HabitId, day: NaiveDate, completed: bool) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !habit_exists(&tx, id)? {
            return Err(RepoError::HabitNotFound(id));
        }

        let sql = if completed {
            "INSERT OR IGNORE INTO habit_completions (habit_uuid, day) VALUES (?1, ?2);"
        } else {
            "DELETE FROM habit_completions WHERE habit_uuid = ?1 AND day = ?2;"
        };
        tx.execute(sql, params![id.to_string(), format_completion_day(day)])?;
        tx.commit()?;

        Ok(())
    }

    fn delete_habit(&self, id: HabitId) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM habit_completions WHERE habit_uuid = ?1;",
            [id_text.as_str()],
        )?;
        let changed = tx.execute("DELETE FROM habits WHERE uuid = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::HabitNotFound(id));
        }
        tx.commit()?;

        Ok(())
    }
}

fn habit_exists(conn: &Connection, id: HabitId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM habits WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_habit(conn: &Connection, id: HabitId) -> RepoResult<Option<Habit>> {
    let id_text = id.to_string();
    let mut stmt = conn.prepare("SELECT description, created_at FROM habits WHERE uuid = ?1;")?;
    let mut rows = stmt.query([id_text.as_str()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let habit = Habit {
        id,
        description: row.get("description")?,
        completed_dates: load_completion_days(conn, &id_text)?,
        created_at: row.get("created_at")?,
    };
    habit.validate()?;
    Ok(Some(habit))
}

fn load_completion_days(conn: &Connection, habit_uuid: &str) -> RepoResult<BTreeSet<NaiveDate>> {
    let mut stmt = conn.prepare("SELECT day FROM habit_completions WHERE habit_uuid = ?1;")?;
    let mut rows = stmt.query([habit_uuid])?;
    let mut days = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        let day = parse_completion_day(&value).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid day `{value}` in habit_completions.day"
            ))
        })?;
        days.insert(day);
    }
    Ok(days)
}
