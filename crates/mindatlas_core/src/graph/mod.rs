//! Pure graph operations over artifact snapshots.
//!
//! # Responsibility
//! - Hold the immutable, versioned artifact collection used by analytics.
//! - Keep link symmetry rules, analytics and filtering free of I/O.
//!
//! # Invariants
//! - Functions here never block and never mutate their input snapshot.
//! - Mutations return a new snapshot; a no-op returns an equal one.

pub mod analytics;
pub mod filter;
pub mod links;
pub mod snapshot;
