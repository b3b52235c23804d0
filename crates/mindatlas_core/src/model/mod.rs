//! Domain model for the personal knowledge graph.
//!
//! # Responsibility
//! - Define artifact, habit and transient insight records.
//! - Keep field validation next to the data it guards.
//!
//! # Invariants
//! - Every artifact and habit is identified by a stable UUID.
//! - Artifact links are symmetric; no artifact links to itself.

pub mod artifact;
pub mod habit;
pub mod insight;
