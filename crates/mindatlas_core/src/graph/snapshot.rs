//! Versioned artifact snapshot.

use crate::model::artifact::{Artifact, ArtifactId};

/// Immutable view of the artifact collection at one point in time.
///
/// `version` increases by one for every mutation that changes the
/// collection, so callers can tell stale views apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSnapshot {
    version: u64,
    artifacts: Vec<Artifact>,
}

impl ArtifactSnapshot {
    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self::with_version(0, artifacts)
    }

    pub fn with_version(version: u64, artifacts: Vec<Artifact>) -> Self {
        Self { version, artifacts }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Artifacts in snapshot order.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Artifact> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn get(&self, id: ArtifactId) -> Option<&Artifact> {
        self.artifacts.iter().find(|artifact| artifact.id == id)
    }

    pub fn contains(&self, id: ArtifactId) -> bool {
        self.get(id).is_some()
    }

    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.artifacts
    }

    /// Produces the successor snapshot holding `artifacts`.
    pub(crate) fn next(&self, artifacts: Vec<Artifact>) -> Self {
        Self::with_version(self.version + 1, artifacts)
    }
}

impl<'a> IntoIterator for &'a ArtifactSnapshot {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}
