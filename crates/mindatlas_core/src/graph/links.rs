//! Link consistency rules.
//!
//! # Responsibility
//! - Add and remove bidirectional links on snapshots.
//! - Cascade artifact removal into every other artifact's links.
//!
//! # Invariants
//! - `a ∈ b.linked_to ⇔ b ∈ a.linked_to` holds before and after every call.
//! - Unknown ids are reported and leave the snapshot untouched; there is no
//!   partial, one-sided outcome.

use crate::graph::snapshot::ArtifactSnapshot;
use crate::model::artifact::ArtifactId;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Referenced id does not resolve in the snapshot.
    UnknownArtifact(ArtifactId),
    /// Both endpoints are the same artifact.
    SelfLink(ArtifactId),
}

impl Display for LinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownArtifact(id) => write!(f, "unknown artifact: {id}"),
            Self::SelfLink(id) => write!(f, "artifact {id} cannot link to itself"),
        }
    }
}

impl Error for LinkError {}

/// Links `a` and `b` in both directions.
///
/// Idempotent: linking an existing pair returns an equal snapshot with the
/// same version.
pub fn add_link(
    snapshot: &ArtifactSnapshot,
    a: ArtifactId,
    b: ArtifactId,
) -> Result<ArtifactSnapshot, LinkError> {
    check_pair(snapshot, a, b)?;

    let already_linked = snapshot
        .get(a)
        .is_some_and(|artifact| artifact.linked_to.contains(&b))
        && snapshot
            .get(b)
            .is_some_and(|artifact| artifact.linked_to.contains(&a));
    if already_linked {
        return Ok(snapshot.clone());
    }

    let artifacts = snapshot
        .iter()
        .cloned()
        .map(|mut artifact| {
            if artifact.id == a {
                artifact.linked_to.insert(b);
            } else if artifact.id == b {
                artifact.linked_to.insert(a);
            }
            artifact
        })
        .collect();
    Ok(snapshot.next(artifacts))
}

/// Removes the link between `a` and `b` in both directions.
pub fn remove_link(
    snapshot: &ArtifactSnapshot,
    a: ArtifactId,
    b: ArtifactId,
) -> Result<ArtifactSnapshot, LinkError> {
    check_pair(snapshot, a, b)?;

    let linked = snapshot
        .get(a)
        .is_some_and(|artifact| artifact.linked_to.contains(&b))
        || snapshot
            .get(b)
            .is_some_and(|artifact| artifact.linked_to.contains(&a));
    if !linked {
        return Ok(snapshot.clone());
    }

    let artifacts = snapshot
        .iter()
        .cloned()
        .map(|mut artifact| {
            if artifact.id == a {
                artifact.linked_to.remove(&b);
            } else if artifact.id == b {
                artifact.linked_to.remove(&a);
            }
            artifact
        })
        .collect();
    Ok(snapshot.next(artifacts))
}

/// Removes `id` and purges it from every remaining artifact's links.
pub fn remove_artifact(
    snapshot: &ArtifactSnapshot,
    id: ArtifactId,
) -> Result<ArtifactSnapshot, LinkError> {
    if !snapshot.contains(id) {
        return Err(LinkError::UnknownArtifact(id));
    }

    let artifacts = snapshot
        .iter()
        .filter(|artifact| artifact.id != id)
        .cloned()
        .map(|mut artifact| {
            artifact.linked_to.remove(&id);
            artifact
        })
        .collect();
    Ok(snapshot.next(artifacts))
}

/// Returns every `(from, to)` pair whose mirror link is missing.
///
/// Dangling targets (ids absent from the snapshot) are reported too.
pub fn asymmetric_links(snapshot: &ArtifactSnapshot) -> Vec<(ArtifactId, ArtifactId)> {
    let mut violations = Vec::new();
    for artifact in snapshot {
        for target in &artifact.linked_to {
            let mirrored = snapshot
                .get(*target)
                .is_some_and(|other| other.linked_to.contains(&artifact.id));
            if !mirrored {
                violations.push((artifact.id, *target));
            }
        }
    }
    violations
}

fn check_pair(snapshot: &ArtifactSnapshot, a: ArtifactId, b: ArtifactId) -> Result<(), LinkError> {
    if a == b {
        return Err(LinkError::SelfLink(a));
    }
    for id in [a, b] {
        if !snapshot.contains(id) {
            return Err(LinkError::UnknownArtifact(id));
        }
    }
    Ok(())
}
