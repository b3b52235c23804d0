//! Artifact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/update/delete over the `artifacts` table.
//! - Own link persistence in `artifact_links`, one row per direction.
//!
//! # Invariants
//! - Every link batch writes both directions or nothing.
//! - Deleting an artifact removes every link row naming it in the same
//!   transaction.
//! - `linked_to` is never written through partial updates.
//! - Listing order is `created_at DESC, uuid ASC`.

use crate::db::DbError;
use crate::model::artifact::{
    is_hex_color, Artifact, ArtifactId, ArtifactPatch, ArtifactValidationError, EnrichmentState,
};
use crate::model::habit::{HabitId, HabitValidationError};
use crate::repo::ensure_tables_ready;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ARTIFACT_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    content,
    primary_emotion,
    keywords,
    color,
    enrichment,
    created_at,
    updated_at
FROM artifacts";

const ARTIFACTS_DEFAULT_LIMIT: u32 = 50;
/// Largest page the store returns in one query.
pub const ARTIFACTS_LIMIT_MAX: u32 = 200;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for artifact and habit persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ArtifactValidationError),
    HabitValidation(HabitValidationError),
    Db(DbError),
    ArtifactNotFound(ArtifactId),
    HabitNotFound(HabitId),
    /// A link batch referenced an id that does not exist.
    UnknownArtifact(ArtifactId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::HabitValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ArtifactNotFound(id) => write!(f, "artifact not found: {id}"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::UnknownArtifact(id) => write!(f, "link references unknown artifact: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "repository requires column `{column}` in table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::HabitValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArtifactValidationError> for RepoError {
    fn from(value: ArtifactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<HabitValidationError> for RepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::HabitValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keyset position after the last item of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactCursor {
    pub created_at: i64,
    pub id: ArtifactId,
}

impl ArtifactCursor {
    pub fn after(artifact: &Artifact) -> Self {
        Self {
            created_at: artifact.created_at,
            id: artifact.id,
        }
    }
}

/// Pagination options for artifact listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactListQuery {
    /// Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    pub after: Option<ArtifactCursor>,
}

/// One page of artifacts, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPage {
    pub items: Vec<Artifact>,
    pub applied_limit: u32,
    /// Present when the page is full and more rows may follow.
    pub next_cursor: Option<ArtifactCursor>,
}

/// Repository interface for artifact and link persistence.
pub trait ArtifactRepository {
    /// Inserts one artifact (and any links it carries) and returns the stored row.
    fn create_artifact(&self, artifact: &Artifact) -> RepoResult<Artifact>;
    fn get_artifact(&self, id: ArtifactId) -> RepoResult<Option<Artifact>>;
    fn list_artifacts(&self, query: &ArtifactListQuery) -> RepoResult<ArtifactPage>;
    /// Every artifact, newest first.
    fn list_all_artifacts(&self) -> RepoResult<Vec<Artifact>>;
    fn count_artifacts(&self) -> RepoResult<u64>;
    /// Applies a partial field update and returns the stored row.
    fn update_artifact(&self, id: ArtifactId, patch: &ArtifactPatch) -> RepoResult<Artifact>;
    /// Writes the derived color and marks the artifact enriched.
    fn set_artifact_color(&self, id: ArtifactId, color: &str) -> RepoResult<()>;
    /// Links every pair in both directions as one batch.
    fn link_artifacts(&self, pairs: &[(ArtifactId, ArtifactId)]) -> RepoResult<()>;
    /// Removes the link between `a` and `b` in both directions.
    fn unlink_artifacts(&self, a: ArtifactId, b: ArtifactId) -> RepoResult<()>;
    /// Deletes one artifact and cascades its links.
    fn delete_artifact(&self, id: ArtifactId) -> RepoResult<()>;
}

/// SQLite-backed artifact repository.
pub struct SqliteArtifactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArtifactRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables_ready(
            conn,
            &[
                (
                    "artifacts",
                    &[
                        "uuid",
                        "title",
                        "content",
                        "primary_emotion",
                        "keywords",
                        "color",
                        "enrichment",
                        "created_at",
                        "updated_at",
                    ],
                ),
                ("artifact_links", &["from_uuid", "to_uuid"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ArtifactRepository for SqliteArtifactRepository<'_> {
    fn create_artifact(&self, artifact: &Artifact) -> RepoResult<Artifact> {
        artifact.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO artifacts (
                uuid,
                title,
                content,
                primary_emotion,
                keywords,
                color,
                enrichment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                artifact.id.to_string(),
                artifact.title.as_str(),
                artifact.content.as_str(),
                artifact.primary_emotion.as_str(),
                encode_keywords(&artifact.keywords)?,
                artifact.color.as_str(),
                enrichment_to_db(artifact.enrichment),
            ],
        )?;
        for target in &artifact.linked_to {
            insert_link_pair(&tx, artifact.id, *target)?;
        }
        let stored = load_artifact(&tx, artifact.id)?
            .ok_or_else(|| RepoError::InvalidData("created artifact missing in read-back".into()))?;
        tx.commit()?;

        Ok(stored)
    }

    fn get_artifact(&self, id: ArtifactId) -> RepoResult<Option<Artifact>> {
        load_artifact(self.conn, id)
    }

    fn list_artifacts(&self, query: &ArtifactListQuery) -> RepoResult<ArtifactPage> {
        let applied_limit = normalize_artifact_limit(query.limit);
        let mut sql = format!("{ARTIFACT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(cursor) = query.after {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND uuid > ?))");
            bind_values.push(Value::Integer(cursor.created_at));
            bind_values.push(Value::Integer(cursor.created_at));
            bind_values.push(Value::Text(cursor.id.to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, uuid ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(applied_limit)));

        let items = query_artifacts(self.conn, &sql, bind_values)?;
        let next_cursor = if items.len() == applied_limit as usize {
            items.last().map(ArtifactCursor::after)
        } else {
            None
        };

        Ok(ArtifactPage {
            items,
            applied_limit,
            next_cursor,
        })
    }

    fn list_all_artifacts(&self) -> RepoResult<Vec<Artifact>> {
        let sql = format!("{ARTIFACT_SELECT_SQL} ORDER BY created_at DESC, uuid ASC");
        query_artifacts(self.conn, &sql, Vec::new())
    }

    fn count_artifacts(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM artifacts;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative artifact count {count}")))
    }

    fn update_artifact(&self, id: ArtifactId, patch: &ArtifactPatch) -> RepoResult<Artifact> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut artifact = load_artifact(&tx, id)?.ok_or(RepoError::ArtifactNotFound(id))?;
        if patch.is_empty() {
            return Ok(artifact);
        }

        patch.apply_to(&mut artifact);
        artifact.validate()?;

        tx.execute(
            "UPDATE artifacts
             SET
                title = ?2,
                content = ?3,
                primary_emotion = ?4,
                keywords = ?5,
                updated_at = CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                artifact.title.as_str(),
                artifact.content.as_str(),
                artifact.primary_emotion.as_str(),
                encode_keywords(&artifact.keywords)?,
            ],
        )?;
        let stored = load_artifact(&tx, id)?.ok_or(RepoError::ArtifactNotFound(id))?;
        tx.commit()?;

        Ok(stored)
    }

    fn set_artifact_color(&self, id: ArtifactId, color: &str) -> RepoResult<()> {
        if !is_hex_color(color) {
            return Err(ArtifactValidationError::InvalidColor(color.to_string()).into());
        }

        let changed = self.conn.execute(
            "UPDATE artifacts
             SET
                color = ?2,
                enrichment = 'enriched',
                updated_at = CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)
             WHERE uuid = ?1;",
            params![id.to_string(), color],
        )?;
        if changed == 0 {
            return Err(RepoError::ArtifactNotFound(id));
        }

        Ok(())
    }

    fn link_artifacts(&self, pairs: &[(ArtifactId, ArtifactId)]) -> RepoResult<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        // Dropping `tx` on any error rolls the whole batch back.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (a, b) in pairs {
            insert_link_pair(&tx, *a, *b)?;
        }
        tx.commit()?;

        Ok(())
    }

    fn unlink_artifacts(&self, a: ArtifactId, b: ArtifactId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for id in [a, b] {
            if !artifact_exists(&tx, id)? {
                return Err(RepoError::UnknownArtifact(id));
            }
        }
        tx.execute(
            "DELETE FROM artifact_links
             WHERE (from_uuid = ?1 AND to_uuid = ?2)
                OR (from_uuid = ?2 AND to_uuid = ?1);",
            params![a.to_string(), b.to_string()],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn delete_artifact(&self, id: ArtifactId) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !artifact_exists(&tx, id)? {
            return Err(RepoError::ArtifactNotFound(id));
        }

        tx.execute(
            "DELETE FROM artifact_links WHERE from_uuid = ?1 OR to_uuid = ?1;",
            [id_text.as_str()],
        )?;
        tx.execute("DELETE FROM artifacts WHERE uuid = ?1;", [id_text.as_str()])?;
        tx.commit()?;

        Ok(())
    }
}

/// Normalizes list limit according to the artifact listing contract.
pub fn normalize_artifact_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => ARTIFACTS_DEFAULT_LIMIT,
        Some(value) if value > ARTIFACTS_LIMIT_MAX => ARTIFACTS_LIMIT_MAX,
        Some(value) => value,
    }
}

fn insert_link_pair(conn: &Connection, a: ArtifactId, b: ArtifactId) -> RepoResult<()> {
    if a == b {
        return Err(ArtifactValidationError::SelfLink(a).into());
    }
    for id in [a, b] {
        if !artifact_exists(conn, id)? {
            return Err(RepoError::UnknownArtifact(id));
        }
    }

    let (a_text, b_text) = (a.to_string(), b.to_string());
    conn.execute(
        "INSERT OR IGNORE INTO artifact_links (from_uuid, to_uuid) VALUES (?1, ?2);",
        params![a_text, b_text],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO artifact_links (from_uuid, to_uuid) VALUES (?1, ?2);",
        params![b_text, a_text],
    )?;
    Ok(())
}

fn artifact_exists(conn: &Connection, id: ArtifactId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM artifacts WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_artifact(conn: &Connection, id: ArtifactId) -> RepoResult<Option<Artifact>> {
    let sql = format!("{ARTIFACT_SELECT_SQL} WHERE uuid = ?");
    let mut artifacts = query_artifacts(conn, &sql, vec![Value::Text(id.to_string())])?;
    Ok(artifacts.pop())
}

fn query_artifacts(conn: &Connection, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Artifact>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut artifacts = Vec::new();
    while let Some(row) = rows.next()? {
        let mut artifact = parse_artifact_row(row)?;
        artifact.linked_to = load_links(conn, artifact.id)?;
        artifact.validate()?;
        artifacts.push(artifact);
    }
    Ok(artifacts)
}

fn load_links(conn: &Connection, id: ArtifactId) -> RepoResult<BTreeSet<ArtifactId>> {
    let mut stmt = conn.prepare("SELECT to_uuid FROM artifact_links WHERE from_uuid = ?1;")?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut links = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        links.insert(parse_uuid(&value, "artifact_links.to_uuid")?);
    }
    Ok(links)
}

fn parse_artifact_row(row: &Row<'_>) -> RepoResult<Artifact> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "artifacts.uuid")?;

    let keywords_text: String = row.get("keywords")?;
    let keywords: Vec<String> = serde_json::from_str(&keywords_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid keywords in artifacts.keywords: {err}"))
    })?;

    let enrichment_text: String = row.get("enrichment")?;
    let enrichment = parse_enrichment(&enrichment_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid enrichment state `{enrichment_text}` in artifacts.enrichment"
        ))
    })?;

    Ok(Artifact {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        primary_emotion: row.get("primary_emotion")?,
        keywords,
        linked_to: BTreeSet::new(),
        color: row.get("color")?,
        enrichment,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn encode_keywords(keywords: &[String]) -> RepoResult<String> {
    serde_json::to_string(keywords)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode keywords: {err}")))
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn enrichment_to_db(state: EnrichmentState) -> &'static str {
    match state {
        EnrichmentState::Created => "created",
        EnrichmentState::Enriched => "enriched",
    }
}

fn parse_enrichment(value: &str) -> Option<EnrichmentState> {
    match value {
        "created" => Some(EnrichmentState::Created),
        "enriched" => Some(EnrichmentState::Enriched),
        _ => None,
    }
}
