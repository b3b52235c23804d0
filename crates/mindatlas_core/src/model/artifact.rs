//! Artifact domain model.
//!
//! # Responsibility
//! - Define the journal entry record rendered as one graph node.
//! - Track the two-phase enrichment lifecycle explicitly.
//!
//! # Invariants
//! - `title`, `content` and `primary_emotion` are non-blank.
//! - `linked_to` never contains the artifact's own id.
//! - `color` is a `#rrggbb` hex string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one artifact.
pub type ArtifactId = Uuid;

/// Neutral grey used until enrichment assigns an emotion color.
pub const PLACEHOLDER_COLOR: &str = "#808080";

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid hex color regex"));

/// Enrichment lifecycle of an artifact.
///
/// A freshly written artifact is `Created`: it carries the placeholder color
/// and no suggested links. It becomes `Enriched` once a derived color has been
/// written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentState {
    Created,
    Enriched,
}

/// Validation failures for artifact fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactValidationError {
    EmptyTitle,
    EmptyContent,
    EmptyPrimaryEmotion,
    SelfLink(ArtifactId),
    InvalidColor(String),
}

impl Display for ArtifactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "artifact title must not be blank"),
            Self::EmptyContent => write!(f, "artifact content must not be blank"),
            Self::EmptyPrimaryEmotion => write!(f, "artifact primary emotion must not be blank"),
            Self::SelfLink(id) => write!(f, "artifact {id} cannot link to itself"),
            Self::InvalidColor(value) => write!(f, "invalid artifact color `{value}`"),
        }
    }
}

impl Error for ArtifactValidationError {}

/// User-supplied fields for a new artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDraft {
    pub title: String,
    pub content: String,
    pub primary_emotion: String,
    pub keywords: Vec<String>,
}

impl ArtifactDraft {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        primary_emotion: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            primary_emotion: primary_emotion.into(),
            keywords: Vec::new(),
        }
    }

    /// Replaces keywords with the parsed form of a comma-separated input.
    pub fn with_keywords(mut self, raw: &str) -> Self {
        self.keywords = parse_keywords(raw);
        self
    }

    pub fn validate(&self) -> Result<(), ArtifactValidationError> {
        validate_text_fields(&self.title, &self.content, &self.primary_emotion)
    }
}

/// Partial update for an existing artifact.
///
/// Links are deliberately absent: they change only through link batches so
/// both directions stay in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub primary_emotion: Option<String>,
    pub keywords: Option<Vec<String>>,
}

impl ArtifactPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.primary_emotion.is_none()
            && self.keywords.is_none()
    }

    /// Applies the patch onto `artifact` in memory.
    pub fn apply_to(&self, artifact: &mut Artifact) {
        if let Some(title) = &self.title {
            artifact.title = title.clone();
        }
        if let Some(content) = &self.content {
            artifact.content = content.clone();
        }
        if let Some(emotion) = &self.primary_emotion {
            artifact.primary_emotion = emotion.clone();
        }
        if let Some(keywords) = &self.keywords {
            artifact.keywords = keywords.clone();
        }
    }
}

/// One journal entry and graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub title: String,
    pub content: String,
    pub primary_emotion: String,
    /// Display order is insertion order.
    pub keywords: Vec<String>,
    pub linked_to: BTreeSet<ArtifactId>,
    pub color: String,
    pub enrichment: EnrichmentState,
    /// Epoch milliseconds, assigned by the store.
    pub created_at: i64,
    /// Epoch milliseconds, assigned by the store.
    pub updated_at: i64,
}

impl Artifact {
    /// Builds an unsaved artifact from a draft with a generated id.
    pub fn from_draft(draft: ArtifactDraft) -> Self {
        Self::with_id(Uuid::new_v4(), draft)
    }

    /// Builds an unsaved artifact with a caller-provided id.
    ///
    /// Starts in `EnrichmentState::Created` with the placeholder color.
    pub fn with_id(id: ArtifactId, draft: ArtifactDraft) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            primary_emotion: draft.primary_emotion,
            keywords: draft.keywords,
            linked_to: BTreeSet::new(),
            color: PLACEHOLDER_COLOR.to_string(),
            enrichment: EnrichmentState::Created,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ArtifactValidationError> {
        validate_text_fields(&self.title, &self.content, &self.primary_emotion)?;
        if self.linked_to.contains(&self.id) {
            return Err(ArtifactValidationError::SelfLink(self.id));
        }
        if !is_hex_color(&self.color) {
            return Err(ArtifactValidationError::InvalidColor(self.color.clone()));
        }
        Ok(())
    }

    pub fn is_enriched(&self) -> bool {
        self.enrichment == EnrichmentState::Enriched
    }

    /// Text handed to hosted-model flows: `"<title>: <content>"`.
    pub fn model_text(&self) -> String {
        format!("{}: {}", self.title, self.content)
    }
}

/// Splits comma-separated keyword input, trimming and dropping blanks.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns whether `value` is a `#rrggbb` color.
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value)
}

fn validate_text_fields(
    title: &str,
    content: &str,
    primary_emotion: &str,
) -> Result<(), ArtifactValidationError> {
    if title.trim().is_empty() {
        return Err(ArtifactValidationError::EmptyTitle);
    }
    if content.trim().is_empty() {
        return Err(ArtifactValidationError::EmptyContent);
    }
    if primary_emotion.trim().is_empty() {
        return Err(ArtifactValidationError::EmptyPrimaryEmotion);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keywords_trims_and_drops_blanks() {
        assert_eq!(
            parse_keywords(" work, ,sleep ,  anxiety,"),
            vec!["work", "sleep", "anxiety"]
        );
        assert!(parse_keywords("   ").is_empty());
    }

    #[test]
    fn new_artifact_starts_created_with_placeholder_color() {
        let artifact = Artifact::from_draft(ArtifactDraft::new("Walk", "Evening walk", "calm"));
        assert_eq!(artifact.color, PLACEHOLDER_COLOR);
        assert_eq!(artifact.enrichment, EnrichmentState::Created);
        assert!(artifact.linked_to.is_empty());
        assert!(artifact.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_fields_self_links_and_bad_colors() {
        let blank = ArtifactDraft::new("  ", "body", "joy");
        assert_eq!(blank.validate(), Err(ArtifactValidationError::EmptyTitle));

        let mut artifact = Artifact::from_draft(ArtifactDraft::new("t", "c", "joy"));
        artifact.linked_to.insert(artifact.id);
        assert_eq!(
            artifact.validate(),
            Err(ArtifactValidationError::SelfLink(artifact.id))
        );

        artifact.linked_to.clear();
        artifact.color = "grey".to_string();
        assert!(matches!(
            artifact.validate(),
            Err(ArtifactValidationError::InvalidColor(_))
        ));
    }

    #[test]
    fn hex_color_accepts_mixed_case() {
        assert!(is_hex_color("#A1b2C3"));
        assert!(!is_hex_color("#abc"));
        assert!(!is_hex_color("a1b2c3"));
    }
}
