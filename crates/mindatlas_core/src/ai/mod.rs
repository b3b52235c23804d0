//! Hosted-model flows behind a typed gateway.
//!
//! # Responsibility
//! - Describe the five model flows and the opaque transport that runs them.
//! - Build request payloads and validate responses into typed values.
//!
//! # Invariants
//! - Callers never see raw model JSON; malformed replies become
//!   `ModelError::InvalidResponse`.
//! - Requests below a flow's minimum sample size are never sent.

pub mod gateway;
pub mod transport;
