//! Core domain logic for Mind Atlas, a personal knowledge graph of
//! emotionally tagged journal artifacts.
//! This crate is the single source of truth for graph and habit invariants.

pub mod ai;
pub mod config;
pub mod db;
pub mod graph;
pub mod habit;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use ai::gateway::{HiddenConnectionReply, ModelGateway, PatternReply, PATTERN_MIN_ARTIFACTS};
pub use ai::transport::{ModelError, ModelFlow, ModelResult, ModelTransport};
pub use config::{AtlasConfig, ConfigLoadError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use graph::analytics::{
    dream_cluster, hub_artifacts, isolated_artifacts, link_stats, LinkStats,
};
pub use graph::filter::{filter_artifacts, ArtifactFilter};
pub use graph::links::{add_link, remove_artifact, remove_link, LinkError};
pub use graph::snapshot::ArtifactSnapshot;
pub use habit::streak::{calculate_streak, current_streak};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::artifact::{
    Artifact, ArtifactDraft, ArtifactId, ArtifactPatch, ArtifactValidationError, EnrichmentState,
};
pub use model::habit::{Habit, HabitId};
pub use model::insight::{AiSuggestion, DetectedPattern, DreamStory, HiddenConnection};
pub use repo::artifact_repo::{
    ArtifactCursor, ArtifactListQuery, ArtifactPage, ArtifactRepository, RepoError, RepoResult,
    SqliteArtifactRepository,
};
pub use repo::habit_repo::{HabitRepository, SqliteHabitRepository};
pub use service::artifact_service::{
    ArtifactService, ArtifactServiceError, EnrichmentFailure, EnrichmentReport, EnrichmentStage,
};
pub use service::habit_service::{HabitService, HabitServiceError, HabitWithStreak};
pub use service::insight_service::{InsightError, InsightService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
