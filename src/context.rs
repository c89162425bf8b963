//! Workflow context carried between review steps
//!
//! An assessment is built in steps (quiz, debug exercise, hands-on), each a
//! separate review session. `WorkflowContext` is the typed record threaded
//! from one step to the next: the parameters the user chose, the step
//! sequence with its cursor, and the identifiers generated by earlier steps.

use crate::error::{ReviewError, Result};
use crate::protocol::Endpoint;
use crate::store::{ArtifactKind, StoreReceipt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Difficulty level used by topics and generation requests
///
/// Deserialization ignores case and surrounding whitespace; an unrecognized
/// level falls back to `Intermediate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    /// Parse a level name in any case
    pub fn parse(name: &str) -> Option<Level> {
        match name.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Level::Beginner),
            "intermediate" => Some(Level::Intermediate),
            "advanced" => Some(Level::Advanced),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let Some(name) = Option::<String>::deserialize(deserializer)? else {
            return Ok(Level::default());
        };
        Ok(Level::parse(&name).unwrap_or_else(|| {
            tracing::debug!(level = %name, "Unknown level, using default");
            Level::default()
        }))
    }
}

/// A tech stack picked by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStackRef {
    pub id: i64,
    pub name: String,
}

/// A topic picked by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRef {
    pub topic_id: i64,
    pub name: String,
    #[serde(default)]
    pub level: Level,
}

/// One step of an assessment-creation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStep {
    Quiz,
    DebugExercise,
    HandsOn,
}

/// Typed context passed between workflow steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<TechStackRef>,
    #[serde(default)]
    pub topics: Vec<TopicRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_questions: Option<u32>,
    /// Duration in minutes (quiz, debug) or days (hands-on)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poc_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<i64>,

    /// Ordered steps of the assessment being built
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    /// Index of the current step
    #[serde(default)]
    pub current_step: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handson_id: Option<String>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tech_stack(mut self, id: i64, name: impl Into<String>) -> Self {
        self.tech_stack = Some(TechStackRef {
            id,
            name: name.into(),
        });
        self
    }

    pub fn with_topic(mut self, topic_id: i64, name: impl Into<String>, level: Level) -> Self {
        self.topics.push(TopicRef {
            topic_id,
            name: name.into(),
            level,
        });
        self
    }

    pub fn with_num_questions(mut self, n: u32) -> Self {
        self.num_questions = Some(n);
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_difficulty(mut self, level: Level) -> Self {
        self.difficulty = Some(level);
        self
    }

    pub fn with_created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = Some(user.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_poc_details(mut self, details: impl Into<String>) -> Self {
        self.poc_details = Some(details.into());
        self
    }

    pub fn with_test_id(mut self, test_id: i64) -> Self {
        self.test_id = Some(test_id);
        self
    }

    pub fn with_steps(mut self, steps: impl IntoIterator<Item = WorkflowStep>) -> Self {
        self.steps = steps.into_iter().collect();
        self.current_step = 0;
        self
    }

    /// Step currently being worked on
    pub fn current(&self) -> Option<WorkflowStep> {
        self.steps.get(self.current_step).copied()
    }

    /// Move to the next step, returning it; `None` once the sequence is done
    pub fn advance(&mut self) -> Option<WorkflowStep> {
        if self.current_step < self.steps.len() {
            self.current_step += 1;
        }
        self.current()
    }

    /// Remember the identifier generated by a store call
    pub fn record(&mut self, receipt: &StoreReceipt) {
        let Some(id) = receipt.id.clone() else {
            return;
        };
        match receipt.kind {
            ArtifactKind::Quiz => self.quiz_id = Some(id),
            ArtifactKind::DebugExercise => self.exercise_id = Some(id),
            ArtifactKind::HandsOn => self.handson_id = Some(id),
            ArtifactKind::Topics => {}
        }
    }

    pub fn tech_stack(&self) -> Result<&TechStackRef> {
        self.tech_stack
            .as_ref()
            .ok_or_else(|| ReviewError::Context("tech stack not selected".to_string()))
    }

    /// Topic names in selection order
    pub fn topic_names(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }

    /// Topic ids in selection order
    pub fn topic_ids(&self) -> Vec<i64> {
        self.topics.iter().map(|t| t.topic_id).collect()
    }

    fn require<T: Copy>(value: Option<T>, field: &str) -> Result<T> {
        value.ok_or_else(|| ReviewError::Context(format!("{} not set", field)))
    }

    /// First frame the agent at `endpoint` expects
    pub fn initial_params(&self, endpoint: &Endpoint) -> Result<Value> {
        let params = match endpoint {
            Endpoint::TopicGeneration => json!({ "name": self.tech_stack()?.name }),
            Endpoint::McqReview => json!({
                "tech_stack": [self.tech_stack()?],
                "topics": self.topics,
                "num_questions": Self::require(self.num_questions, "num_questions")?,
                "duration": Self::require(self.duration, "duration")?,
            }),
            Endpoint::DebugExercise => json!({
                "tech_stack": [self.tech_stack()?],
                "concepts": self.topics,
                "num_questions": Self::require(self.num_questions, "num_questions")?,
                "duration": Self::require(self.duration, "duration")?,
                "difficulty": self.difficulty,
            }),
            Endpoint::DebugGen => json!({
                "test_id": self.test_id,
                "tech_stack": self.tech_stack()?.name,
                "topics": self.topic_names(),
                "difficulty": self.difficulty.unwrap_or_default(),
                "duration": self.duration.unwrap_or(1),
            }),
            Endpoint::CreateHandson => json!({
                "tech_stack": self.tech_stack()?.name,
                "topics": self.topic_names(),
                "duration": self.duration.unwrap_or(1),
            }),
            Endpoint::EpicReview => json!({
                "poc_details": self
                    .poc_details
                    .as_deref()
                    .ok_or_else(|| ReviewError::Context("poc_details not set".to_string()))?,
            }),
            Endpoint::Custom { path, .. } => {
                return Err(ReviewError::Context(format!(
                    "no initial parameters defined for custom endpoint {}",
                    path
                )))
            }
        };
        Ok(params)
    }
}
