//! Transient insight records produced by hosted-model flows.
//!
//! None of these are persisted as-is. Accepting a suggestion or hidden
//! connection persists a link; accepting a pattern persists a habit.

use crate::model::artifact::ArtifactId;
use serde::{Deserialize, Serialize};

/// Proposed link from a newly created artifact to an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub linked_artifact_id: ArtifactId,
    pub connection_reason: String,
}

/// Proposed link between an isolated artifact and a hub artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenConnection {
    pub from_id: ArtifactId,
    pub to_id: ArtifactId,
    pub reason: String,
}

/// Recurring negative pattern, `from` concept leading to `to` concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub from: String,
    pub to: String,
    pub explanation: String,
    pub suggested_habit: Option<String>,
}

/// Short narrative woven from a cluster of artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DreamStory {
    pub title: String,
    pub story: String,
}
