//! Typed gateway over the model transport.
//!
//! # Responsibility
//! - Build each flow's JSON payload from domain values.
//! - Decode and validate replies so callers only see typed results.
//!
//! # Invariants
//! - Connection suggestions only reference ids that were offered.
//! - A hidden connection only names a hub that was offered.
//! - Pattern analysis is never requested below `PATTERN_MIN_ARTIFACTS`.

use crate::ai::transport::{ModelError, ModelFlow, ModelResult, ModelTransport};
use crate::model::artifact::{is_hex_color, Artifact, ArtifactId};
use crate::model::insight::{AiSuggestion, DetectedPattern, DreamStory, HiddenConnection};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Instant;

/// Minimum artifact count before a recurring-pattern request is issued.
pub const PATTERN_MIN_ARTIFACTS: usize = 10;

/// Outcome of a hidden-connection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HiddenConnectionReply {
    Found(HiddenConnection),
    NotFound,
}

/// Outcome of a recurring-pattern request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternReply {
    Found(DetectedPattern),
    NotFound,
}

/// Typed entry point for every hosted-model flow.
pub struct ModelGateway<T: ModelTransport> {
    transport: T,
}

impl<T: ModelTransport> ModelGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Maps an emotion label to a `#rrggbb` color.
    pub fn classify_emotion_color(&self, emotion: &str) -> ModelResult<String> {
        let flow = ModelFlow::ClassifyEmotionColor;
        let reply: ColorReply = self.call(flow, &ColorRequest { emotion })?;
        let color = reply.color.trim();
        if !is_hex_color(color) {
            return Err(ModelError::invalid(
                flow,
                format!("color `{color}` is not #rrggbb"),
            ));
        }
        Ok(color.to_ascii_lowercase())
    }

    /// Proposes links from `new_artifact` to members of `existing`.
    ///
    /// Returns an empty list without a request when `existing` is empty.
    /// Suggestions naming unknown ids, the new artifact itself, or an id
    /// already suggested are dropped.
    pub fn suggest_connections(
        &self,
        new_artifact: &Artifact,
        existing: &[&Artifact],
    ) -> ModelResult<Vec<AiSuggestion>> {
        let flow = ModelFlow::SuggestConnections;
        if existing.is_empty() {
            return Ok(Vec::new());
        }

        let request = SuggestionRequest {
            new_artifact: ArtifactText::from(new_artifact),
            existing_artifacts: existing.iter().map(|a| ArtifactText::from(*a)).collect(),
        };
        let reply: SuggestionReply = self.call(flow, &request)?;

        let offered: HashSet<ArtifactId> = existing.iter().map(|a| a.id).collect();
        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();
        let mut dropped = 0usize;
        for raw in reply.suggestions {
            let accepted = uuid::Uuid::parse_str(raw.linked_artifact_id.trim())
                .ok()
                .filter(|id| *id != new_artifact.id && offered.contains(id))
                .filter(|id| seen.insert(*id));
            match accepted {
                Some(linked_artifact_id) => suggestions.push(AiSuggestion {
                    linked_artifact_id,
                    connection_reason: raw.connection_reason.trim().to_string(),
                }),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(
                "event=model_reply_filtered module=ai status=ok flow={} dropped={}",
                flow, dropped
            );
        }

        Ok(suggestions)
    }

    /// Asks whether `isolated` relates to one of `hubs`.
    pub fn find_hidden_connection(
        &self,
        isolated: &Artifact,
        hubs: &[&Artifact],
    ) -> ModelResult<HiddenConnectionReply> {
        let flow = ModelFlow::FindHiddenConnection;
        if hubs.is_empty() {
            return Ok(HiddenConnectionReply::NotFound);
        }

        let request = HiddenConnectionRequest {
            isolated_artifact: ArtifactText::from(isolated),
            hub_artifacts: hubs.iter().map(|a| ArtifactText::from(*a)).collect(),
        };
        let reply: HiddenConnectionResponse = self.call(flow, &request)?;
        if !reply.is_connection_found {
            return Ok(HiddenConnectionReply::NotFound);
        }

        let hub_text = reply
            .hub_artifact_id
            .ok_or_else(|| ModelError::invalid(flow, "connection found without hubArtifactId"))?;
        let hub_id = uuid::Uuid::parse_str(hub_text.trim())
            .map_err(|_| ModelError::invalid(flow, "hubArtifactId is not a uuid"))?;
        if !hubs.iter().any(|hub| hub.id == hub_id) {
            return Err(ModelError::invalid(
                flow,
                format!("hub {hub_id} was not offered"),
            ));
        }
        let explanation = required_text(flow, reply.explanation, "explanation")?;

        Ok(HiddenConnectionReply::Found(HiddenConnection {
            from_id: isolated.id,
            to_id: hub_id,
            reason: explanation,
        }))
    }

    /// Looks for a recurring emotional pattern across `artifacts`.
    pub fn find_recurring_pattern(&self, artifacts: &[&Artifact]) -> ModelResult<PatternReply> {
        let flow = ModelFlow::FindRecurringPattern;
        if artifacts.len() < PATTERN_MIN_ARTIFACTS {
            return Err(ModelError::InsufficientData {
                flow,
                required: PATTERN_MIN_ARTIFACTS,
                actual: artifacts.len(),
            });
        }

        let request = PatternRequest {
            artifacts: artifacts
                .iter()
                .map(|a| PatternArtifact {
                    id: a.id.to_string(),
                    primary_emotion: &a.primary_emotion,
                    keywords: &a.keywords,
                    linked_to: a.linked_to.iter().map(ToString::to_string).collect(),
                })
                .collect(),
        };
        let reply: PatternResponse = self.call(flow, &request)?;
        if !reply.is_pattern_found {
            return Ok(PatternReply::NotFound);
        }

        let pattern = reply
            .pattern
            .ok_or_else(|| ModelError::invalid(flow, "pattern found without pattern"))?;
        let from = required_text(flow, Some(pattern.from), "pattern.from")?;
        let to = required_text(flow, Some(pattern.to), "pattern.to")?;
        let explanation = required_text(flow, reply.explanation, "explanation")?;
        let suggested_habit = reply
            .suggested_habit
            .map(|habit| habit.trim().to_string())
            .filter(|habit| !habit.is_empty());

        Ok(PatternReply::Found(DetectedPattern {
            from,
            to,
            explanation,
            suggested_habit,
        }))
    }

    /// Writes a short story woven from a cluster of artifacts.
    pub fn weave_dream(&self, cluster: &[&Artifact]) -> ModelResult<DreamStory> {
        let flow = ModelFlow::WeaveDream;
        if cluster.is_empty() {
            return Err(ModelError::InsufficientData {
                flow,
                required: 1,
                actual: 0,
            });
        }

        let request = DreamRequest {
            artifacts: cluster
                .iter()
                .map(|a| DreamArtifact {
                    title: &a.title,
                    primary_emotion: &a.primary_emotion,
                    keywords: &a.keywords,
                })
                .collect(),
        };
        let reply: DreamResponse = self.call(flow, &request)?;

        Ok(DreamStory {
            title: required_text(flow, Some(reply.title), "title")?,
            story: required_text(flow, Some(reply.story), "story")?,
        })
    }

    fn call<Req, Resp>(&self, flow: ModelFlow, request: &Req) -> ModelResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_value(request)
            .map_err(|err| ModelError::transport(flow, format!("payload encode failed: {err}")))?;

        let started_at = Instant::now();
        let result = self
            .transport
            .invoke(flow, &payload)
            .and_then(|value| decode_reply(flow, value));
        let duration_ms = started_at.elapsed().as_millis();

        match &result {
            Ok(_) => info!(
                "event=model_call module=ai status=ok flow={} duration_ms={}",
                flow, duration_ms
            ),
            Err(err) => warn!(
                "event=model_call module=ai status=error flow={} duration_ms={} error_code={}",
                flow,
                duration_ms,
                err.code()
            ),
        }
        result
    }
}

fn decode_reply<Resp: DeserializeOwned>(flow: ModelFlow, value: Value) -> ModelResult<Resp> {
    serde_json::from_value(value).map_err(|err| ModelError::invalid(flow, err.to_string()))
}

fn required_text(flow: ModelFlow, value: Option<String>, field: &str) -> ModelResult<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ModelError::invalid(flow, format!("`{field}` is missing or empty")))
}

#[derive(Serialize)]
struct ColorRequest<'a> {
    emotion: &'a str,
}

#[derive(Deserialize)]
struct ColorReply {
    color: String,
}

#[derive(Serialize)]
struct ArtifactText {
    id: String,
    content: String,
}

impl From<&Artifact> for ArtifactText {
    fn from(artifact: &Artifact) -> Self {
        Self {
            id: artifact.id.to_string(),
            content: artifact.model_text(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionRequest {
    new_artifact: ArtifactText,
    existing_artifacts: Vec<ArtifactText>,
}

#[derive(Deserialize)]
struct SuggestionReply {
    #[serde(default)]
    suggestions: Vec<RawSuggestion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSuggestion {
    linked_artifact_id: String,
    #[serde(default)]
    connection_reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HiddenConnectionRequest {
    isolated_artifact: ArtifactText,
    hub_artifacts: Vec<ArtifactText>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HiddenConnectionResponse {
    is_connection_found: bool,
    #[serde(default)]
    hub_artifact_id: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Serialize)]
struct PatternRequest<'a> {
    artifacts: Vec<PatternArtifact<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatternArtifact<'a> {
    id: String,
    primary_emotion: &'a str,
    keywords: &'a [String],
    linked_to: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatternResponse {
    is_pattern_found: bool,
    #[serde(default)]
    pattern: Option<RawPattern>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    suggested_habit: Option<String>,
}

#[derive(Deserialize)]
struct RawPattern {
    from: String,
    to: String,
}

#[derive(Serialize)]
struct DreamRequest<'a> {
    artifacts: Vec<DreamArtifact<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DreamArtifact<'a> {
    title: &'a str,
    primary_emotion: &'a str,
    keywords: &'a [String],
}

#[derive(Deserialize)]
struct DreamResponse {
    title: String,
    story: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::artifact::ArtifactDraft;
    use serde_json::json;
    use std::cell::RefCell;
    use uuid::Uuid;

    struct Scripted {
        reply: ModelResult<Value>,
        requests: RefCell<Vec<(ModelFlow, Value)>>,
    }

    impl Scripted {
        fn ok(reply: Value) -> Self {
            Self {
                reply: Ok(reply),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModelTransport for Scripted {
        fn invoke(&self, flow: ModelFlow, payload: &Value) -> ModelResult<Value> {
            self.requests.borrow_mut().push((flow, payload.clone()));
            self.reply.clone()
        }
    }

    fn artifact(n: u128, title: &str) -> Artifact {
        let draft = ArtifactDraft::new(title, "body", "calm");
        Artifact::with_id(Uuid::from_u128(n), draft)
    }

    #[test]
    fn color_is_validated_and_lowercased() {
        let gateway = ModelGateway::new(Scripted::ok(json!({ "color": "#A1B2C3" })));
        assert_eq!(gateway.classify_emotion_color("joy").unwrap(), "#a1b2c3");

        let (flow, payload) = gateway.transport().requests.borrow()[0].clone();
        assert_eq!(flow, ModelFlow::ClassifyEmotionColor);
        assert_eq!(payload, json!({ "emotion": "joy" }));
    }

    #[test]
    fn malformed_color_is_invalid_response() {
        let gateway = ModelGateway::new(Scripted::ok(json!({ "color": "blue" })));
        let err = gateway.classify_emotion_color("sad").unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse { .. }));
    }

    #[test]
    fn suggestions_skip_request_without_candidates() {
        let gateway = ModelGateway::new(Scripted::ok(json!({ "suggestions": [] })));
        let result = gateway.suggest_connections(&artifact(1, "a"), &[]).unwrap();
        assert!(result.is_empty());
        assert!(gateway.transport().requests.borrow().is_empty());
    }

    #[test]
    fn suggestions_drop_unknown_self_and_duplicate_ids() {
        let new = artifact(1, "new");
        let known = artifact(2, "known");
        let reply = json!({
            "suggestions": [
                { "linkedArtifactId": Uuid::from_u128(2).to_string(), "connectionReason": "shared calm" },
                { "linkedArtifactId": Uuid::from_u128(2).to_string(), "connectionReason": "again" },
                { "linkedArtifactId": Uuid::from_u128(1).to_string(), "connectionReason": "self" },
                { "linkedArtifactId": Uuid::from_u128(9).to_string(), "connectionReason": "ghost" },
                { "linkedArtifactId": "not-a-uuid", "connectionReason": "junk" }
            ]
        });
        let gateway = ModelGateway::new(Scripted::ok(reply));

        let result = gateway.suggest_connections(&new, &[&known]).unwrap();
        assert_eq!(
            result,
            vec![AiSuggestion {
                linked_artifact_id: Uuid::from_u128(2),
                connection_reason: "shared calm".to_string(),
            }]
        );

        let (_, payload) = gateway.transport().requests.borrow()[0].clone();
        assert_eq!(payload["newArtifact"]["content"], "new: body");
        assert_eq!(payload["existingArtifacts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn hidden_connection_must_name_offered_hub() {
        let isolated = artifact(1, "alone");
        let hub = artifact(2, "hub");
        let reply = json!({
            "isConnectionFound": true,
            "hubArtifactId": Uuid::from_u128(7).to_string(),
            "explanation": "x"
        });
        let gateway = ModelGateway::new(Scripted::ok(reply));
        let err = gateway.find_hidden_connection(&isolated, &[&hub]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse { .. }));
    }

    #[test]
    fn hidden_connection_found_and_not_found() {
        let isolated = artifact(1, "alone");
        let hub = artifact(2, "hub");
        let found = ModelGateway::new(Scripted::ok(json!({
            "isConnectionFound": true,
            "hubArtifactId": Uuid::from_u128(2).to_string(),
            "explanation": "both about the sea"
        })));
        assert_eq!(
            found.find_hidden_connection(&isolated, &[&hub]).unwrap(),
            HiddenConnectionReply::Found(HiddenConnection {
                from_id: Uuid::from_u128(1),
                to_id: Uuid::from_u128(2),
                reason: "both about the sea".to_string(),
            })
        );

        let none = ModelGateway::new(Scripted::ok(json!({ "isConnectionFound": false })));
        assert_eq!(
            none.find_hidden_connection(&isolated, &[&hub]).unwrap(),
            HiddenConnectionReply::NotFound
        );
    }

    #[test]
    fn pattern_request_needs_minimum_sample() {
        let items: Vec<Artifact> = (1..=9).map(|n| artifact(n, "a")).collect();
        let refs: Vec<&Artifact> = items.iter().collect();
        let gateway = ModelGateway::new(Scripted::ok(json!({ "isPatternFound": false })));

        let err = gateway.find_recurring_pattern(&refs).unwrap_err();
        assert_eq!(
            err,
            ModelError::InsufficientData {
                flow: ModelFlow::FindRecurringPattern,
                required: 10,
                actual: 9,
            }
        );
        assert!(gateway.transport().requests.borrow().is_empty());
    }

    #[test]
    fn pattern_found_keeps_optional_habit() {
        let items: Vec<Artifact> = (1..=10).map(|n| artifact(n, "a")).collect();
        let refs: Vec<&Artifact> = items.iter().collect();
        let gateway = ModelGateway::new(Scripted::ok(json!({
            "isPatternFound": true,
            "pattern": { "from": "anxiety", "to": "relief" },
            "explanation": "walks help",
            "suggestedHabit": "  "
        })));

        let reply = gateway.find_recurring_pattern(&refs).unwrap();
        assert_eq!(
            reply,
            PatternReply::Found(DetectedPattern {
                from: "anxiety".to_string(),
                to: "relief".to_string(),
                explanation: "walks help".to_string(),
                suggested_habit: None,
            })
        );
    }

    #[test]
    fn dream_rejects_empty_cluster_and_blank_story() {
        let gateway = ModelGateway::new(Scripted::ok(json!({ "title": "Night", "story": "" })));
        assert!(matches!(
            gateway.weave_dream(&[]).unwrap_err(),
            ModelError::InsufficientData { required: 1, .. }
        ));

        let a = artifact(1, "a");
        assert!(matches!(
            gateway.weave_dream(&[&a]).unwrap_err(),
            ModelError::InvalidResponse { .. }
        ));
    }

    #[test]
    fn transport_error_passes_through() {
        let gateway = ModelGateway::new(Scripted {
            reply: Err(ModelError::transport(ModelFlow::ClassifyEmotionColor, "offline")),
            requests: RefCell::new(Vec::new()),
        });
        let err = gateway.classify_emotion_color("joy").unwrap_err();
        assert_eq!(err.code(), "model_transport_failed");
    }
}
