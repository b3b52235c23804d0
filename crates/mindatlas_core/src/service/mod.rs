//! Atlas use-case services.
//!
//! # Responsibility
//! - Orchestrate repositories, graph analytics and the model gateway into
//!   the operations callers use.
//! - Keep callers away from SQL and raw model JSON.

pub mod artifact_service;
pub mod habit_service;
pub mod insight_service;
