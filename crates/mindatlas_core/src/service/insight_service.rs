//! Insight use-case service.
//!
//! # Responsibility
//! - Select graph context (isolated artifacts, hubs, clusters) from a
//!   snapshot and hand it to the matching model flow.
//!
//! # Invariants
//! - Analyses below their minimum sample size fail with `InsufficientData`
//!   before any model request is issued.
//! - Nothing here writes; accepted results are persisted by the caller.

use crate::ai::gateway::{HiddenConnectionReply, ModelGateway, PatternReply};
use crate::ai::transport::{ModelError, ModelTransport};
use crate::config::{GraphSettings, InsightSettings};
use crate::graph::analytics::{dream_cluster, hub_artifacts, isolated_artifacts};
use crate::graph::links::LinkError;
use crate::graph::snapshot::ArtifactSnapshot;
use crate::model::artifact::{Artifact, ArtifactId};
use crate::model::insight::{DreamStory, HiddenConnection};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightError {
    InsufficientData { required: usize, actual: usize },
    UnknownArtifact(ArtifactId),
    SelfLink(ArtifactId),
    Model(ModelError),
}

impl Display for InsightError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData { required, actual } => write!(
                f,
                "analysis needs at least {required} artifacts, got {actual}"
            ),
            Self::UnknownArtifact(id) => write!(f, "unknown artifact: {id}"),
            Self::SelfLink(id) => write!(f, "artifact {id} cannot link to itself"),
            Self::Model(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InsightError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for InsightError {
    fn from(value: ModelError) -> Self {
        match value {
            ModelError::InsufficientData {
                required, actual, ..
            } => Self::InsufficientData { required, actual },
            other => Self::Model(other),
        }
    }
}

impl From<LinkError> for InsightError {
    fn from(value: LinkError) -> Self {
        match value {
            LinkError::UnknownArtifact(id) => Self::UnknownArtifact(id),
            LinkError::SelfLink(id) => Self::SelfLink(id),
        }
    }
}

/// Model-backed analyses over artifact snapshots.
pub struct InsightService {
    graph: GraphSettings,
    insight: InsightSettings,
}

impl InsightService {
    pub fn new(graph: GraphSettings, insight: InsightSettings) -> Self {
        Self { graph, insight }
    }

    /// Looks for a link between the first isolated artifact and a hub.
    ///
    /// Returns `Ok(None)` when the snapshot has no isolated artifact, no
    /// linked hub, or the model finds nothing.
    pub fn discover_hidden_connection<T: ModelTransport>(
        &self,
        snapshot: &ArtifactSnapshot,
        gateway: &ModelGateway<T>,
    ) -> Result<Option<HiddenConnection>, InsightError> {
        self.require(snapshot.len(), self.graph.hidden_connection_min_artifacts)?;

        let isolated = isolated_artifacts(snapshot);
        let hubs: Vec<&Artifact> = hub_artifacts(snapshot, self.graph.hub_count)
            .into_iter()
            .filter(|hub| !hub.linked_to.is_empty())
            .collect();
        let Some(candidate) = isolated.first() else {
            return Ok(None);
        };
        if hubs.is_empty() {
            return Ok(None);
        }

        let reply = gateway.find_hidden_connection(candidate, &hubs)?;
        info!(
            "event=hidden_connection module=service status=ok artifact_id={} hubs={} found={}",
            candidate.id,
            hubs.len(),
            matches!(reply, HiddenConnectionReply::Found(_))
        );
        Ok(match reply {
            HiddenConnectionReply::Found(connection) => Some(connection),
            HiddenConnectionReply::NotFound => None,
        })
    }

    /// Asks for a recurring emotional pattern across the whole snapshot.
    ///
    /// Pass a snapshot of the full collection
    /// (`ArtifactService::load_full_snapshot`); a recent-window snapshot
    /// only shows the model part of the history.
    pub fn analyze_patterns<T: ModelTransport>(
        &self,
        snapshot: &ArtifactSnapshot,
        gateway: &ModelGateway<T>,
    ) -> Result<PatternReply, InsightError> {
        self.require(snapshot.len(), self.insight.pattern_min_artifacts)?;
        let artifacts: Vec<&Artifact> = snapshot.iter().collect();
        Ok(gateway.find_recurring_pattern(&artifacts)?)
    }

    /// Weaves a story from `root_id` and its linked artifacts.
    pub fn weave_dream<T: ModelTransport>(
        &self,
        snapshot: &ArtifactSnapshot,
        root_id: ArtifactId,
        gateway: &ModelGateway<T>,
    ) -> Result<DreamStory, InsightError> {
        let cluster = dream_cluster(snapshot, root_id)?;
        Ok(gateway.weave_dream(&cluster)?)
    }

    fn require(&self, actual: usize, required: usize) -> Result<(), InsightError> {
        if actual < required {
            return Err(InsightError::InsufficientData { required, actual });
        }
        Ok(())
    }
}
