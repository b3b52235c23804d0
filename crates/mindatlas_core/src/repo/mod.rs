//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for artifacts and habits.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate records before any SQL mutation.
//! - Link writes and cascade deletes run inside one immediate transaction.
//! - Repositories refuse connections that are not fully migrated.

pub mod artifact_repo;
pub mod habit_repo;

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{table_exists, table_has_column};
use artifact_repo::{RepoError, RepoResult};
use rusqlite::Connection;

/// Checks schema version plus required tables and columns.
pub(crate) fn ensure_tables_ready(
    conn: &Connection,
    tables: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}
