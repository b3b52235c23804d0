//! Model transport seam and flow error types.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for model flow calls.
pub type ModelResult<T> = Result<T, ModelError>;

/// Hosted-model flows used by the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFlow {
    ClassifyEmotionColor,
    SuggestConnections,
    FindHiddenConnection,
    FindRecurringPattern,
    WeaveDream,
}

impl ModelFlow {
    /// Stable flow name used in logs and transport routing.
    pub fn name(self) -> &'static str {
        match self {
            Self::ClassifyEmotionColor => "classify_emotion_color",
            Self::SuggestConnections => "suggest_connections",
            Self::FindHiddenConnection => "find_hidden_connection",
            Self::FindRecurringPattern => "find_recurring_pattern",
            Self::WeaveDream => "weave_dream",
        }
    }
}

impl Display for ModelFlow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures of one model flow call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The transport could not produce a reply.
    Transport { flow: ModelFlow, message: String },
    /// The reply did not match the flow's output contract.
    InvalidResponse { flow: ModelFlow, reason: String },
    /// The request is below the flow's minimum sample size and was not sent.
    InsufficientData {
        flow: ModelFlow,
        required: usize,
        actual: usize,
    },
}

impl ModelError {
    pub fn transport(flow: ModelFlow, message: impl Into<String>) -> Self {
        Self::Transport {
            flow,
            message: message.into(),
        }
    }

    pub fn invalid(flow: ModelFlow, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            flow,
            reason: reason.into(),
        }
    }

    pub fn flow(&self) -> ModelFlow {
        match self {
            Self::Transport { flow, .. }
            | Self::InvalidResponse { flow, .. }
            | Self::InsufficientData { flow, .. } => *flow,
        }
    }

    /// Stable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "model_transport_failed",
            Self::InvalidResponse { .. } => "model_invalid_response",
            Self::InsufficientData { .. } => "insufficient_data",
        }
    }
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { flow, message } => write!(f, "model flow {flow} failed: {message}"),
            Self::InvalidResponse { flow, reason } => {
                write!(f, "model flow {flow} returned an invalid response: {reason}")
            }
            Self::InsufficientData {
                flow,
                required,
                actual,
            } => write!(
                f,
                "model flow {flow} needs at least {required} artifacts, got {actual}"
            ),
        }
    }
}

impl Error for ModelError {}

/// Opaque request/response channel to a hosted model.
///
/// Implementations own prompt wording, authentication and network I/O; they
/// receive the flow's JSON input and return the model's JSON output.
pub trait ModelTransport {
    fn invoke(&self, flow: ModelFlow, payload: &Value) -> ModelResult<Value>;
}

impl<T: ModelTransport + ?Sized> ModelTransport for &T {
    fn invoke(&self, flow: ModelFlow, payload: &Value) -> ModelResult<Value> {
        (**self).invoke(flow, payload)
    }
}

impl<T: ModelTransport + ?Sized> ModelTransport for std::sync::Arc<T> {
    fn invoke(&self, flow: ModelFlow, payload: &Value) -> ModelResult<Value> {
        (**self).invoke(flow, payload)
    }
}
