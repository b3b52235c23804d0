//! Artifact use-case service.
//!
//! # Responsibility
//! - Create, edit and delete artifacts through the repository.
//! - Run enrichment (color + connection suggestions) as a separate step
//!   after the primary write.
//! - Persist accepted suggestions and hidden connections as link batches.
//!
//! # Invariants
//! - Enrichment failures never undo the primary write and are not retried.
//! - Accepting links either persists every pair or none.

use crate::ai::gateway::ModelGateway;
use crate::ai::transport::{ModelError, ModelTransport};
use crate::config::{EnrichmentSettings, GraphSettings};
use crate::graph::analytics::{link_stats, LinkStats};
use crate::graph::snapshot::ArtifactSnapshot;
use crate::model::artifact::{
    Artifact, ArtifactDraft, ArtifactId, ArtifactPatch, ArtifactValidationError,
};
use crate::model::insight::{AiSuggestion, HiddenConnection};
use crate::repo::artifact_repo::{ArtifactListQuery, ArtifactPage, ArtifactRepository, RepoError};
use log::{info, warn};
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for artifact use-cases.
#[derive(Debug)]
pub enum ArtifactServiceError {
    Validation(ArtifactValidationError),
    NotFound(ArtifactId),
    /// A link referenced an id that does not resolve; nothing was written.
    UnknownArtifact(ArtifactId),
    /// The primary create/update/delete/link write failed.
    StoreWriteFailure(RepoError),
    StoreReadFailure(RepoError),
}

impl Display for ArtifactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "artifact not found: {id}"),
            Self::UnknownArtifact(id) => write!(f, "unknown artifact: {id}"),
            Self::StoreWriteFailure(err) => write!(f, "store write failed: {err}"),
            Self::StoreReadFailure(err) => write!(f, "store read failed: {err}"),
        }
    }
}

impl Error for ArtifactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StoreWriteFailure(err) | Self::StoreReadFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl ArtifactServiceError {
    fn from_write(err: RepoError) -> Self {
        match err {
            RepoError::Validation(inner) => Self::Validation(inner),
            RepoError::ArtifactNotFound(id) => Self::NotFound(id),
            RepoError::UnknownArtifact(id) => Self::UnknownArtifact(id),
            other => Self::StoreWriteFailure(other),
        }
    }

    fn from_read(err: RepoError) -> Self {
        match err {
            RepoError::ArtifactNotFound(id) => Self::NotFound(id),
            other => Self::StoreReadFailure(other),
        }
    }
}

/// Enrichment step that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentStage {
    Color,
    Suggestions,
}

impl EnrichmentStage {
    fn name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Suggestions => "suggestions",
        }
    }
}

/// One failed enrichment step. Logged at warn level, never retried.
#[derive(Debug)]
pub enum EnrichmentFailure {
    Model {
        stage: EnrichmentStage,
        error: ModelError,
    },
    Store {
        stage: EnrichmentStage,
        error: RepoError,
    },
}

impl EnrichmentFailure {
    pub fn stage(&self) -> EnrichmentStage {
        match self {
            Self::Model { stage, .. } | Self::Store { stage, .. } => *stage,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Model { error, .. } => error.code(),
            Self::Store { .. } => "store_failed",
        }
    }
}

/// Outcome of one enrichment run.
#[derive(Debug)]
pub struct EnrichmentReport {
    pub artifact_id: ArtifactId,
    /// Derived color, when it was both classified and written.
    pub color: Option<String>,
    /// Pending suggestions for the user to approve.
    pub suggestions: Vec<AiSuggestion>,
    pub failures: Vec<EnrichmentFailure>,
}

impl EnrichmentReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Artifact service facade over repository implementations.
pub struct ArtifactService<R: ArtifactRepository> {
    repo: R,
    graph: GraphSettings,
    enrichment: EnrichmentSettings,
    snapshot_version: Cell<u64>,
}

impl<R: ArtifactRepository> ArtifactService<R> {
    pub fn new(repo: R, graph: GraphSettings, enrichment: EnrichmentSettings) -> Self {
        Self {
            repo,
            graph,
            enrichment,
            snapshot_version: Cell::new(0),
        }
    }

    /// Persists a new artifact in the `Created` state with the placeholder color.
    pub fn create_artifact(&self, draft: ArtifactDraft) -> Result<Artifact, ArtifactServiceError> {
        draft.validate().map_err(ArtifactServiceError::Validation)?;
        let mut artifact = Artifact::from_draft(draft);
        artifact.color = self.enrichment.placeholder_color.clone();

        let stored = self
            .repo
            .create_artifact(&artifact)
            .map_err(ArtifactServiceError::from_write)?;
        info!(
            "event=artifact_create module=service status=ok artifact_id={}",
            stored.id
        );
        Ok(stored)
    }

    /// Derives the artifact's color and proposes connections.
    ///
    /// The color call and the suggestion call run independently; a failure
    /// in one is recorded in the report and does not stop the other.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist.
    /// - `StoreReadFailure` when the artifact cannot be loaded.
    pub fn enrich_artifact<T: ModelTransport>(
        &self,
        id: ArtifactId,
        gateway: &ModelGateway<T>,
    ) -> Result<EnrichmentReport, ArtifactServiceError> {
        let artifact = self.get_artifact(id)?;
        let mut report = EnrichmentReport {
            artifact_id: id,
            color: None,
            suggestions: Vec::new(),
            failures: Vec::new(),
        };

        match gateway.classify_emotion_color(&artifact.primary_emotion) {
            Ok(color) => match self.repo.set_artifact_color(id, &color) {
                Ok(()) => report.color = Some(color),
                Err(error) => report.failures.push(EnrichmentFailure::Store {
                    stage: EnrichmentStage::Color,
                    error,
                }),
            },
            Err(error) => report.failures.push(EnrichmentFailure::Model {
                stage: EnrichmentStage::Color,
                error,
            }),
        }

        match self.suggestion_context(id) {
            Ok(context) => {
                let existing: Vec<&Artifact> = context.iter().collect();
                match gateway.suggest_connections(&artifact, &existing) {
                    Ok(suggestions) => report.suggestions = suggestions,
                    Err(error) => report.failures.push(EnrichmentFailure::Model {
                        stage: EnrichmentStage::Suggestions,
                        error,
                    }),
                }
            }
            Err(error) => report.failures.push(EnrichmentFailure::Store {
                stage: EnrichmentStage::Suggestions,
                error,
            }),
        }

        for failure in &report.failures {
            warn!(
                "event=artifact_enrich module=service status=error artifact_id={} stage={} error_code={}",
                id,
                failure.stage().name(),
                failure.code()
            );
        }
        info!(
            "event=artifact_enrich module=service status=ok artifact_id={} colored={} suggestions={} failures={}",
            id,
            report.color.is_some(),
            report.suggestions.len(),
            report.failures.len()
        );
        Ok(report)
    }

    pub fn get_artifact(&self, id: ArtifactId) -> Result<Artifact, ArtifactServiceError> {
        self.repo
            .get_artifact(id)
            .map_err(ArtifactServiceError::from_read)?
            .ok_or(ArtifactServiceError::NotFound(id))
    }

    /// Applies a partial update. Links are not part of a patch.
    pub fn update_artifact(
        &self,
        id: ArtifactId,
        patch: &ArtifactPatch,
    ) -> Result<Artifact, ArtifactServiceError> {
        self.repo
            .update_artifact(id, patch)
            .map_err(ArtifactServiceError::from_write)
    }

    /// Deletes the artifact and every link naming it.
    pub fn delete_artifact(&self, id: ArtifactId) -> Result<(), ArtifactServiceError> {
        self.repo
            .delete_artifact(id)
            .map_err(ArtifactServiceError::from_write)?;
        info!(
            "event=artifact_delete module=service status=ok artifact_id={}",
            id
        );
        Ok(())
    }

    /// Links `source` to each suggested artifact as one batch.
    pub fn approve_suggestions(
        &self,
        source: ArtifactId,
        suggestions: &[AiSuggestion],
    ) -> Result<(), ArtifactServiceError> {
        let pairs: Vec<(ArtifactId, ArtifactId)> = suggestions
            .iter()
            .map(|suggestion| (source, suggestion.linked_artifact_id))
            .collect();
        self.write_links(&pairs)
    }

    pub fn accept_hidden_connection(
        &self,
        connection: &HiddenConnection,
    ) -> Result<(), ArtifactServiceError> {
        self.write_links(&[(connection.from_id, connection.to_id)])
    }

    /// Links two artifacts in both directions.
    pub fn link_artifacts(&self, a: ArtifactId, b: ArtifactId) -> Result<(), ArtifactServiceError> {
        self.write_links(&[(a, b)])
    }

    pub fn unlink_artifacts(
        &self,
        a: ArtifactId,
        b: ArtifactId,
    ) -> Result<(), ArtifactServiceError> {
        self.repo
            .unlink_artifacts(a, b)
            .map_err(ArtifactServiceError::from_write)
    }

    /// Loads the most recent artifacts as a new snapshot.
    ///
    /// `limit` falls back to `graph.load_limit` and is clamped to
    /// `ARTIFACTS_LIMIT_MAX` (200). Each call yields a higher version than the
    /// previous one from this service. Use [`Self::load_full_snapshot`] when an
    /// analysis needs the whole collection.
    pub fn load_snapshot(
        &self,
        limit: Option<u32>,
    ) -> Result<ArtifactSnapshot, ArtifactServiceError> {
        let query = ArtifactListQuery {
            limit: Some(limit.unwrap_or(self.graph.load_limit)),
            after: None,
        };
        let page = self
            .repo
            .list_artifacts(&query)
            .map_err(ArtifactServiceError::from_read)?;

        Ok(ArtifactSnapshot::with_version(
            self.next_snapshot_version(),
            page.items,
        ))
    }

    /// Loads every stored artifact, newest first, as a new snapshot.
    pub fn load_full_snapshot(&self) -> Result<ArtifactSnapshot, ArtifactServiceError> {
        let all = self
            .repo
            .list_all_artifacts()
            .map_err(ArtifactServiceError::from_read)?;
        Ok(ArtifactSnapshot::with_version(self.next_snapshot_version(), all))
    }

    /// One page of artifacts; an unset limit uses `graph.page_size`.
    pub fn list_page(&self, query: &ArtifactListQuery) -> Result<ArtifactPage, ArtifactServiceError> {
        let query = ArtifactListQuery {
            limit: Some(query.limit.unwrap_or(self.graph.page_size)),
            after: query.after,
        };
        self.repo
            .list_artifacts(&query)
            .map_err(ArtifactServiceError::from_read)
    }

    /// Artifact count and undirected link count over the whole store.
    pub fn atlas_stats(&self) -> Result<LinkStats, ArtifactServiceError> {
        let all = self
            .repo
            .list_all_artifacts()
            .map_err(ArtifactServiceError::from_read)?;
        Ok(link_stats(&ArtifactSnapshot::new(all)))
    }

    fn next_snapshot_version(&self) -> u64 {
        let version = self.snapshot_version.get() + 1;
        self.snapshot_version.set(version);
        version
    }

    fn write_links(&self, pairs: &[(ArtifactId, ArtifactId)]) -> Result<(), ArtifactServiceError> {
        self.repo
            .link_artifacts(pairs)
            .map_err(ArtifactServiceError::from_write)?;
        info!(
            "event=artifact_link module=service status=ok pairs={}",
            pairs.len()
        );
        Ok(())
    }

    /// Most recent artifacts other than `id`, up to `suggestion_context`.
    fn suggestion_context(&self, id: ArtifactId) -> Result<Vec<Artifact>, RepoError> {
        let wanted = self.enrichment.suggestion_context;
        if wanted == 0 {
            return Ok(Vec::new());
        }

        let query = ArtifactListQuery {
            limit: Some(u32::try_from(wanted.saturating_add(1)).unwrap_or(u32::MAX)),
            after: None,
        };
        let page = self.repo.list_artifacts(&query)?;
        Ok(page
            .items
            .into_iter()
            .filter(|artifact| artifact.id != id)
            .take(wanted)
            .collect())
    }
}
