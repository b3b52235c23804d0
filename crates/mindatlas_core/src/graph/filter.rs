//! Visible-set filtering for the atlas view.
//!
//! # Invariants
//! - The orphan filter runs before the text filter.
//! - Text matching is case-insensitive, unanchored substring matching.

use crate::graph::analytics::connected_ids;
use crate::graph::snapshot::ArtifactSnapshot;
use crate::model::artifact::Artifact;

/// Filter controls for the atlas view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFilter {
    pub search_term: String,
    pub include_orphans: bool,
}

impl Default for ArtifactFilter {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            include_orphans: true,
        }
    }
}

impl ArtifactFilter {
    pub fn apply<'a>(&self, snapshot: &'a ArtifactSnapshot) -> Vec<&'a Artifact> {
        filter_artifacts(snapshot, &self.search_term, self.include_orphans)
    }
}

/// Narrows `snapshot` by connectivity and free-text match.
pub fn filter_artifacts<'a>(
    snapshot: &'a ArtifactSnapshot,
    search_term: &str,
    include_orphans: bool,
) -> Vec<&'a Artifact> {
    let mut visible: Vec<&Artifact> = snapshot.iter().collect();

    if !include_orphans {
        let connected = connected_ids(snapshot);
        visible.retain(|artifact| connected.contains(&artifact.id));
    }

    if search_term.is_empty() {
        return visible;
    }

    let needle = search_term.to_lowercase();
    visible.retain(|artifact| matches_search(artifact, &needle));
    visible
}

/// `needle` must already be lowercase.
fn matches_search(artifact: &Artifact, needle: &str) -> bool {
    artifact.title.to_lowercase().contains(needle)
        || artifact.content.to_lowercase().contains(needle)
        || artifact.primary_emotion.to_lowercase().contains(needle)
        || artifact
            .keywords
            .iter()
            .any(|keyword| keyword.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::artifact::{ArtifactDraft, ArtifactId};
    use uuid::Uuid;

    fn artifact(n: u128, links: &[u128]) -> Artifact {
        let mut artifact = Artifact::with_id(
            Uuid::from_u128(n),
            ArtifactDraft::new(format!("entry {n}"), "plain body", "neutral"),
        );
        artifact
            .linked_to
            .extend(links.iter().map(|link| Uuid::from_u128(*link)));
        artifact
    }

    fn ids(artifacts: &[&Artifact]) -> Vec<ArtifactId> {
        artifacts.iter().map(|artifact| artifact.id).collect()
    }

    #[test]
    fn orphan_filter_keeps_link_targets_with_empty_own_links() {
        let snapshot =
            ArtifactSnapshot::new(vec![artifact(1, &[]), artifact(2, &[3]), artifact(3, &[])]);

        let visible = filter_artifacts(&snapshot, "", false);
        assert_eq!(ids(&visible), vec![Uuid::from_u128(2), Uuid::from_u128(3)]);

        let everything = filter_artifacts(&snapshot, "", true);
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut joyful = artifact(1, &[]);
        joyful.primary_emotion = "joy".to_string();
        let mut tagged = artifact(2, &[]);
        tagged.keywords = vec!["Overjoyed".to_string()];
        let mut titled = artifact(3, &[]);
        titled.title = "JOYRIDE".to_string();
        let plain = artifact(4, &[]);
        let snapshot = ArtifactSnapshot::new(vec![joyful, tagged, titled, plain]);

        let hits = filter_artifacts(&snapshot, "Joy", true);
        assert_eq!(
            ids(&hits),
            vec![Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)]
        );
    }

    #[test]
    fn search_matches_content_substrings() {
        let mut artifact = artifact(1, &[]);
        artifact.content = "Walked by the harbour at dusk".to_string();
        let snapshot = ArtifactSnapshot::new(vec![artifact]);

        assert_eq!(filter_artifacts(&snapshot, "BOUR AT", true).len(), 1);
        assert!(filter_artifacts(&snapshot, "sunrise", true).is_empty());
    }

    #[test]
    fn filters_compose_orphans_first() {
        let mut linked = artifact(1, &[2]);
        linked.title = "storm".to_string();
        let target = artifact(2, &[1]);
        let mut orphan = artifact(3, &[]);
        orphan.title = "storm again".to_string();
        let snapshot = ArtifactSnapshot::new(vec![linked, target, orphan]);

        let filter = ArtifactFilter {
            search_term: "storm".to_string(),
            include_orphans: false,
        };
        assert_eq!(ids(&filter.apply(&snapshot)), vec![Uuid::from_u128(1)]);
    }

    #[test]
    fn default_filter_shows_everything() {
        let snapshot = ArtifactSnapshot::new(vec![artifact(1, &[]), artifact(2, &[])]);
        assert_eq!(ArtifactFilter::default().apply(&snapshot).len(), 2);
    }
}
