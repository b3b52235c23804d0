//! Graph analytics over artifact snapshots.
//!
//! # Responsibility
//! - Rank hub artifacts by total degree.
//! - Find isolated artifacts and aggregate link statistics.
//! - Collect the artifact cluster around one root for story synthesis.
//!
//! # Invariants
//! - Every function is total over well-formed snapshots; empty input yields
//!   empty output.
//! - Hub ties keep first-appearance order while scanning the snapshot
//!   (artifact id first, then its link targets in id order).

use crate::graph::links::LinkError;
use crate::graph::snapshot::ArtifactSnapshot;
use crate::model::artifact::{Artifact, ArtifactId};
use std::collections::{HashMap, HashSet};

/// Aggregate counts shown on the profile view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub artifact_count: usize,
    /// Undirected links; each symmetric pair counts once.
    pub link_count: usize,
}

/// Returns up to `count` artifacts ordered by descending hub score.
///
/// Score is outgoing links plus incoming references. Ids that rank but do not
/// resolve to an artifact in the snapshot are dropped, so fewer than `count`
/// results may come back.
pub fn hub_artifacts(snapshot: &ArtifactSnapshot, count: usize) -> Vec<&Artifact> {
    if count == 0 {
        return Vec::new();
    }

    let mut first_seen: Vec<ArtifactId> = Vec::new();
    let mut scores: HashMap<ArtifactId, usize> = HashMap::new();
    for artifact in snapshot {
        bump_score(
            &mut scores,
            &mut first_seen,
            artifact.id,
            artifact.linked_to.len(),
        );
        for target in &artifact.linked_to {
            bump_score(&mut scores, &mut first_seen, *target, 1);
        }
    }

    let mut ranked: Vec<(ArtifactId, usize)> = first_seen
        .into_iter()
        .map(|id| (id, scores.get(&id).copied().unwrap_or_default()))
        .collect();
    // Stable sort keeps first-appearance order among equal scores.
    ranked.sort_by(|left, right| right.1.cmp(&left.1));

    ranked
        .into_iter()
        .take(count)
        .filter_map(|(id, _)| snapshot.get(id))
        .collect()
}

/// Returns artifacts with no outgoing links that nobody links to.
pub fn isolated_artifacts(snapshot: &ArtifactSnapshot) -> Vec<&Artifact> {
    let connected = connected_ids(snapshot);
    snapshot
        .iter()
        .filter(|artifact| artifact.linked_to.is_empty() && !connected.contains(&artifact.id))
        .collect()
}

/// Ids of every artifact with at least one outgoing link, plus their targets.
pub fn connected_ids(snapshot: &ArtifactSnapshot) -> HashSet<ArtifactId> {
    let mut connected = HashSet::new();
    for artifact in snapshot {
        if artifact.linked_to.is_empty() {
            continue;
        }
        connected.insert(artifact.id);
        connected.extend(artifact.linked_to.iter().copied());
    }
    connected
}

/// Counts artifacts and undirected links.
pub fn link_stats(snapshot: &ArtifactSnapshot) -> LinkStats {
    let directed: usize = snapshot
        .iter()
        .map(|artifact| artifact.linked_to.len())
        .sum();
    LinkStats {
        artifact_count: snapshot.len(),
        link_count: directed / 2,
    }
}

/// Returns `root` and its linked artifacts, in snapshot order.
///
/// Link targets missing from the snapshot are skipped.
pub fn dream_cluster(
    snapshot: &ArtifactSnapshot,
    root: ArtifactId,
) -> Result<Vec<&Artifact>, LinkError> {
    let root_artifact = snapshot.get(root).ok_or(LinkError::UnknownArtifact(root))?;
    let members: HashSet<ArtifactId> = root_artifact
        .linked_to
        .iter()
        .copied()
        .chain(std::iter::once(root))
        .collect();

    Ok(snapshot
        .iter()
        .filter(|artifact| members.contains(&artifact.id))
        .collect())
}

fn bump_score(
    scores: &mut HashMap<ArtifactId, usize>,
    first_seen: &mut Vec<ArtifactId>,
    id: ArtifactId,
    by: usize,
) {
    let score = scores.entry(id).or_insert_with(|| {
        first_seen.push(id);
        0
    });
    *score += by;
}
