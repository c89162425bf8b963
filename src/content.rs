//! Typed review contents
//!
//! Each agent proposes a different kind of content. `ReviewContent` ties a
//! content type to the point at which it is persisted and to the store
//! request built from it.

use crate::context::{Level, WorkflowContext};
use crate::error::{ReviewError, Result};
use crate::store::{ArtifactKind, StoreRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// When reviewed content is handed to the artifact store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPoint {
    /// Never persisted by the session
    Never,
    /// Persisted when the reviewer approves the last proposal
    OnApprove,
    /// Persisted when the agent delivers its final content
    OnFinal,
}

/// Content an agent proposes for review
pub trait ReviewContent: DeserializeOwned + Send + 'static {
    const PERSIST_AT: PersistPoint = PersistPoint::Never;

    /// Build the store request for this content
    ///
    /// Only called when `PERSIST_AT` is not `Never`.
    fn store_request(&self, _ctx: &WorkflowContext) -> Result<Option<StoreRequest>> {
        Ok(None)
    }

    /// Copy anything the next workflow step needs into `ctx` once finalized
    fn update_context(&self, _ctx: &mut WorkflowContext) {}
}

impl ReviewContent for String {}

impl ReviewContent for Value {}

/// A generated topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub level: Level,
}

/// Topic list proposed by the topic generation agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TopicListWire")]
pub struct TopicList {
    pub topics: Vec<Topic>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TopicListWire {
    Bare(Vec<Topic>),
    Wrapped { topics: Vec<Topic> },
}

impl From<TopicListWire> for TopicList {
    fn from(wire: TopicListWire) -> Self {
        match wire {
            TopicListWire::Bare(topics) | TopicListWire::Wrapped { topics } => Self { topics },
        }
    }
}

impl TopicList {
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl ReviewContent for TopicList {
    const PERSIST_AT: PersistPoint = PersistPoint::OnApprove;

    fn store_request(&self, ctx: &WorkflowContext) -> Result<Option<StoreRequest>> {
        let tech_stack = ctx.tech_stack()?;
        let body = json!({
            "topicName": tech_stack.name,
            "description": ctx.description.clone().unwrap_or_default(),
            "selectedTopics": self.topics,
            "totalSelected": self.topics.len(),
            "created_by": ctx.created_by.clone().unwrap_or_default(),
        });
        Ok(Some(StoreRequest::new(ArtifactKind::Topics, body)))
    }
}

/// One multiple choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqQuestion {
    pub question: String,
    /// Options keyed by letter ("A".."D")
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
    pub explanation: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
}

impl McqQuestion {
    fn is_complete(&self) -> bool {
        !self.question.is_empty()
            && !self.options.is_empty()
            && !self.correct_answer.is_empty()
            && !self.explanation.is_empty()
    }
}

/// MCQ quiz proposed by the quiz agent
///
/// On the wire a quiz is an object keyed `question1`..`questionN`. Questions
/// are ordered by that number; incomplete entries are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Quiz {
    pub questions: Vec<McqQuestion>,
}

fn question_number(key: &str) -> u64 {
    key.trim_start_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .unwrap_or(u64::MAX)
}

impl From<Map<String, Value>> for Quiz {
    fn from(map: Map<String, Value>) -> Self {
        let mut entries: Vec<(String, Value)> = map.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| {
            question_number(a)
                .cmp(&question_number(b))
                .then(a.cmp(b))
        });

        let questions = entries
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<McqQuestion>(value) {
                Ok(q) if q.is_complete() => Some(q),
                _ => {
                    tracing::debug!(key = %key, "Incomplete quiz question skipped");
                    None
                }
            })
            .collect();
        Self { questions }
    }
}

impl From<Quiz> for Map<String, Value> {
    fn from(quiz: Quiz) -> Self {
        quiz.questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| (format!("question{}", i + 1), json!(q)))
            .collect()
    }
}

impl Quiz {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl ReviewContent for Quiz {
    const PERSIST_AT: PersistPoint = PersistPoint::OnApprove;

    fn store_request(&self, ctx: &WorkflowContext) -> Result<Option<StoreRequest>> {
        if self.is_empty() {
            return Err(ReviewError::Protocol(
                "quiz has no complete questions to store".to_string(),
            ));
        }
        let tech_stack = ctx.tech_stack()?;
        let questions: Map<String, Value> = self.clone().into();
        let body = json!({
            "params": {
                "tech_stack": tech_stack.id,
                "topics": ctx.topic_ids(),
                "num_questions": ctx.num_questions.unwrap_or(self.len() as u32),
                "duration": ctx.duration,
            },
            "questions": questions,
        });
        Ok(Some(StoreRequest::new(ArtifactKind::Quiz, body)))
    }
}

/// Debug exercises proposed by the debug exercise agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExerciseSetWire")]
pub struct ExerciseSet {
    pub exercises: Vec<Value>,
    pub metadata: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExerciseSetWire {
    Bare(Vec<Value>),
    Wrapped {
        exercises: Vec<Value>,
        #[serde(default)]
        metadata: Value,
    },
}

impl From<ExerciseSetWire> for ExerciseSet {
    fn from(wire: ExerciseSetWire) -> Self {
        match wire {
            ExerciseSetWire::Bare(exercises) => Self {
                exercises,
                metadata: Value::Null,
            },
            ExerciseSetWire::Wrapped {
                exercises,
                metadata,
            } => Self {
                exercises,
                metadata,
            },
        }
    }
}

impl ReviewContent for ExerciseSet {
    const PERSIST_AT: PersistPoint = PersistPoint::OnApprove;

    fn store_request(&self, ctx: &WorkflowContext) -> Result<Option<StoreRequest>> {
        let tech_stack = ctx.tech_stack()?;
        let body = json!({
            "tech_stack_id": tech_stack.id,
            "topic_ids": ctx.topic_ids(),
            "num_questions": ctx.num_questions.unwrap_or(self.exercises.len() as u32),
            "duration": ctx.duration,
            "exercises": {
                "exercises": self.exercises,
                "metadata": self.metadata,
            },
            "calibration_feedback": "",
        });
        Ok(Some(StoreRequest::new(ArtifactKind::DebugExercise, body)))
    }
}

/// Hands-on project: the SRS under review, then the generated project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandsOnProject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srs_md: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boilerplate_files: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HandsOnProject {
    /// Whether the project files have been generated
    pub fn is_generated(&self) -> bool {
        self.path_id.is_some()
    }
}

impl ReviewContent for HandsOnProject {
    const PERSIST_AT: PersistPoint = PersistPoint::OnFinal;

    fn store_request(&self, ctx: &WorkflowContext) -> Result<Option<StoreRequest>> {
        if !self.is_generated() {
            return Ok(None);
        }
        let mut project = self.clone();
        if project.tech_stack.is_none() {
            project.tech_stack = ctx.tech_stack.as_ref().map(|t| t.name.clone());
        }
        if project.topics.is_empty() {
            project.topics = ctx.topic_names();
        }
        if project.duration.is_none() {
            project.duration = ctx.duration;
        }
        Ok(Some(StoreRequest::new(
            ArtifactKind::HandsOn,
            serde_json::to_value(project)?,
        )))
    }
}

/// Extra topic the debug-gen agent proposes adding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SuggestedTopicWire")]
pub struct SuggestedTopic {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestedTopicWire {
    Name(String),
    Full {
        topic: String,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl From<SuggestedTopicWire> for SuggestedTopic {
    fn from(wire: SuggestedTopicWire) -> Self {
        match wire {
            SuggestedTopicWire::Name(topic) => Self {
                topic,
                reason: None,
            },
            SuggestedTopicWire::Full { topic, reason } => Self { topic, reason },
        }
    }
}

/// Debug project brief from the debug-gen agent
///
/// Reviews carry the BRD with initial and suggested topics; the final frame
/// carries the id of the created debug exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectBrief {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brd: Option<String>,
    #[serde(default)]
    pub initial_topics: Vec<String>,
    #[serde(default)]
    pub suggested_topics: Vec<SuggestedTopic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_exercise: Option<Value>,
}

impl ProjectBrief {
    /// Initial and suggested topics, deduplicated in order
    pub fn all_topics(&self) -> Vec<String> {
        let suggested = self.suggested_topics.iter().map(|s| &s.topic);
        let mut seen: Vec<String> = Vec::new();
        for topic in self.initial_topics.iter().chain(suggested) {
            if !seen.contains(topic) {
                seen.push(topic.clone());
            }
        }
        seen
    }

    /// Created debug exercise id, once the project is generated
    pub fn exercise_id(&self) -> Option<String> {
        match self.debug_exercise.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl ReviewContent for ProjectBrief {
    fn update_context(&self, ctx: &mut WorkflowContext) {
        if let Some(id) = self.exercise_id() {
            ctx.exercise_id = Some(id);
        }
    }
}
