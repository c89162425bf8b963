//! Agent wire protocol: inbound envelope normalization and decision dialects
//!
//! Agents send JSON frames tagged with `type`. Several agents use their own
//! tags and field layouts (`srs_review`, `brd_review`, `final_id`); they are
//! folded into one `AgentMessage` shape here so the session state machine only
//! deals with `review` / `final` / `error` / `status`.
//!
//! Outgoing decisions use the canonical `DecisionKind` vocabulary. Each
//! endpoint's `Dialect` maps it to the frame that agent expects:
//!
//! | Style       | Endpoints                                   | Frame                                             |
//! |-------------|---------------------------------------------|---------------------------------------------------|
//! | `Verdict`   | topic-generation, mcq-review, debug-exercise, epic-review | `{"decision":"APPROVE","feedback":"..."}` |
//! | `Action`    | create-handson                              | `{"action":"approve"}` / `{"action":"suggest","suggestions":[..]}` |
//! | `Selection` | debug-gen-ws                                | `{"final_topics":[..],"feedback":"..."}` (approve only) |

use crate::error::{ReviewError, Result};
use crate::types::{AgentMessage, DecisionKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Decode one inbound text frame into a normalized message
pub fn decode_frame(text: &str) -> Result<AgentMessage> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut obj) = value else {
        return Err(ReviewError::Protocol(format!(
            "expected a JSON object frame, got: {}",
            truncate(text, 80)
        )));
    };

    let tag = match obj.remove("type") {
        Some(Value::String(tag)) => tag,
        _ => String::new(),
    };

    let mut iteration = obj.get("iteration").and_then(Value::as_u64);
    let mut max_iterations = None;

    let content = match tag.as_str() {
        // Hands-on agent: SRS markdown and regeneration counters at top level
        "srs_review" => {
            iteration = obj.get("regen_count").and_then(Value::as_u64);
            max_iterations = obj.get("max_regen").and_then(Value::as_u64);
            match obj.remove("content") {
                Some(content) if !content.is_null() => content,
                _ => json!({ "srs_md": obj.remove("srs_md").unwrap_or(Value::Null) }),
            }
        }
        // Debug-gen agent: BRD with initial and suggested topics at top level
        "brd_review" => json!({
            "brd": obj.remove("brd").unwrap_or(Value::Null),
            "initial_topics": obj.remove("initial_topics").unwrap_or_else(|| json!([])),
            "suggested_topics": obj.remove("suggested_topics").unwrap_or_else(|| json!([])),
        }),
        // Debug-gen agent: created record id, no content field
        "final_id" => Value::Object(obj),
        _ => obj.remove("content").unwrap_or(Value::Null),
    };

    let mut message = AgentMessage::new(tag, content);
    message.iteration = iteration;
    message.max_iterations = max_iterations;
    Ok(message)
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// How an endpoint expects decisions to be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecisionStyle {
    /// `{"decision": "APPROVE"|"REJECT"|"FEEDBACK"|"REFINE", "feedback": ...}`
    Verdict,
    /// `{"action": "approve"|"suggest", "suggestions": [...]}`
    Action,
    /// `{"final_topics": [...], "feedback": ...}`; only approval is expressible
    Selection,
}

/// Decision encoding rules for one agent endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialect {
    /// Frame layout for decisions
    pub style: DecisionStyle,

    /// Whether the agent answers an approval with a `final` frame
    ///
    /// When false, approval is terminal on the client side.
    pub approval_round_trip: bool,
}

impl Dialect {
    pub const VERDICT: Dialect = Dialect {
        style: DecisionStyle::Verdict,
        approval_round_trip: true,
    };

    pub const ACTION: Dialect = Dialect {
        style: DecisionStyle::Action,
        approval_round_trip: true,
    };

    pub const SELECTION: Dialect = Dialect {
        style: DecisionStyle::Selection,
        approval_round_trip: true,
    };

    /// Whether this dialect can express the given decision kind
    pub fn supports(&self, kind: DecisionKind) -> bool {
        match self.style {
            DecisionStyle::Verdict | DecisionStyle::Action => true,
            DecisionStyle::Selection => kind == DecisionKind::Approve,
        }
    }

    /// Encode a decision into the wire frame, or `None` if unsupported
    pub fn encode(
        &self,
        kind: DecisionKind,
        feedback: Option<&str>,
        selection: &[String],
    ) -> Option<Value> {
        if !self.supports(kind) {
            return None;
        }

        let frame = match self.style {
            DecisionStyle::Verdict => {
                let mut frame = Map::new();
                frame.insert(
                    "decision".to_string(),
                    Value::String(kind.as_str().to_uppercase()),
                );
                if let Some(text) = feedback {
                    frame.insert("feedback".to_string(), Value::String(text.to_string()));
                }
                Value::Object(frame)
            }
            DecisionStyle::Action => match kind {
                DecisionKind::Approve => json!({ "action": "approve" }),
                _ => json!({
                    "action": "suggest",
                    "suggestions": split_suggestions(feedback.unwrap_or_default()),
                }),
            },
            DecisionStyle::Selection => {
                let final_topics = if selection.is_empty() {
                    Value::Null
                } else {
                    json!(selection)
                };
                json!({
                    "final_topics": final_topics,
                    "feedback": feedback.unwrap_or_default(),
                })
            }
        };

        Some(frame)
    }
}

/// Split free-text suggestions on commas and newlines
fn split_suggestions(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Known agent endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Tech-stack topic generation
    TopicGeneration,
    /// MCQ quiz generation
    McqReview,
    /// Debug exercise generation
    DebugExercise,
    /// Debug project generation (BRD review, bug injection)
    DebugGen,
    /// Hands-on project generation (SRS review)
    CreateHandson,
    /// Epic drafting from POC details
    EpicReview,
    /// Any other agent endpoint
    Custom { path: String, dialect: Dialect },
}

impl Endpoint {
    /// URL path relative to the websocket base address
    pub fn path(&self) -> &str {
        match self {
            Endpoint::TopicGeneration => "/ws/topic-generation",
            Endpoint::McqReview => "/ws/mcq-review",
            Endpoint::DebugExercise => "/ws/debug-exercise",
            Endpoint::DebugGen => "/ws/debug-gen-ws",
            Endpoint::CreateHandson => "/ws/create-handson",
            Endpoint::EpicReview => "/ws/epic-review",
            Endpoint::Custom { path, .. } => path,
        }
    }

    /// Decision dialect spoken by this endpoint
    pub fn dialect(&self) -> Dialect {
        match self {
            Endpoint::TopicGeneration
            | Endpoint::McqReview
            | Endpoint::DebugExercise
            | Endpoint::EpicReview => Dialect::VERDICT,
            Endpoint::CreateHandson => Dialect::ACTION,
            Endpoint::DebugGen => Dialect::SELECTION,
            Endpoint::Custom { dialect, .. } => *dialect,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &str {
        self.path().trim_start_matches("/ws/")
    }
}
