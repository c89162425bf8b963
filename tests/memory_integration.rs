//! Memory transport integration tests
//!
//! End-to-end review sessions against an in-process agent peer. Covers the
//! review loop, failures, re-opening, per-endpoint decision frames, and
//! persistence on approval and on final content.

use a3s_review::{
    ArtifactKind, ArtifactStore, Decision, DecisionOutcome, DecisionStyle, Dialect, Endpoint,
    ExerciseSet, FailureKind,
    HandsOnProject, IgnoreReason, Level, MemoryArtifactStore, MemoryConnector, MemoryPeer, Phase,
    ProjectBrief, Quiz, ReviewConfig, ReviewContent, ReviewError, ReviewSession, SessionEvent,
    TopicList, WorkflowContext, WorkflowStep,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn config() -> ReviewConfig {
    ReviewConfig::new("ws://agents.test", "http://api.test").with_token("jwt")
}

async fn open<T: ReviewContent>(
    endpoint: Endpoint,
    params: Value,
) -> (ReviewSession<T>, MemoryPeer, MemoryConnector) {
    let connector = MemoryConnector::new();
    let mut session = ReviewSession::new(Arc::new(connector.clone()), config(), endpoint);
    session.open(&params).await.unwrap();

    let mut peer = connector.accept().await.unwrap();
    assert_eq!(peer.recv_json().await.unwrap(), params);
    (session, peer, connector)
}

fn quiz_context() -> WorkflowContext {
    WorkflowContext::new()
        .with_tech_stack(3, "Java")
        .with_topic(11, "Streams", Level::Intermediate)
        .with_num_questions(1)
        .with_duration(15)
        .with_steps([WorkflowStep::Quiz, WorkflowStep::DebugExercise])
}

fn quiz_content() -> Value {
    json!({
        "question1": {
            "question": "What does map return?",
            "options": {"A": "A list", "B": "A stream", "C": "A set", "D": "Nothing"},
            "correctAnswer": "B",
            "explanation": "Intermediate operations return streams.",
            "topics": ["Streams"],
            "concepts": ["map"]
        }
    })
}

// ─── Review loop ─────────────────────────────────────────────────

#[tokio::test]
async fn test_feedback_then_final() {
    let (mut session, mut peer, _connector) =
        open::<Value>(Endpoint::TopicGeneration, json!({"tech_stack": "Java"})).await;
    assert_eq!(peer.url(), "ws://agents.test/ws/topic-generation?token=jwt");

    peer.send_json(&json!({"type": "review", "content": ["topicA"], "iteration": 1}));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 1 })
    );
    assert_eq!(session.state().phase(), Phase::AwaitingDecision);
    assert_eq!(session.state().iteration(), 1);

    let outcome = session
        .submit_decision(Decision::feedback("add topicB"))
        .await
        .unwrap();
    assert_eq!(outcome, DecisionOutcome::Sent);
    assert_eq!(session.state().phase(), Phase::AwaitingFirstResponse);
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"decision": "FEEDBACK", "feedback": "add topicB"})
    );

    peer.send_json(&json!({"type": "final", "content": ["topicA", "topicB"]}));
    assert_eq!(session.next_event().await, Some(SessionEvent::Finalized));
    assert_eq!(session.state().phase(), Phase::Finalized);
    assert_eq!(session.content(), Some(&json!(["topicA", "topicB"])));
}

#[tokio::test]
async fn test_error_then_late_review_is_discarded() {
    let (mut session, peer, _connector) =
        open::<Value>(Endpoint::TopicGeneration, json!({"name": "Java"})).await;

    peer.send_json(&json!({"type": "error", "content": "rate limited"}));
    peer.send_json(&json!({"type": "review", "content": ["late"], "iteration": 1}));

    match session.next_event().await {
        Some(SessionEvent::Failed(reason)) => {
            assert_eq!(reason.kind, FailureKind::Agent);
            assert_eq!(reason.message, "rate limited");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    while let Some(event) = session.next_event().await {
        assert!(matches!(event, SessionEvent::Discarded { .. }));
    }
    assert_eq!(session.state().phase(), Phase::Failed);
    assert_eq!(session.state().iteration(), 0);
    assert!(session.content().is_none());
}

#[tokio::test]
async fn test_iteration_only_moves_forward_on_reviews() {
    let (mut session, peer, _connector) =
        open::<Value>(Endpoint::McqReview, json!({"num_questions": 1})).await;

    peer.send_json(&json!({"type": "status", "content": "Generating"}));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Status("Generating".to_string()))
    );
    assert_eq!(session.state().iteration(), 0);

    peer.send_json(&json!({"type": "review", "content": {}, "iteration": 5}));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 5 })
    );

    session.submit_decision(Decision::reject()).await.unwrap();

    // Agent restarts its own counter; ours never goes back
    peer.send_json(&json!({"type": "review", "content": {}, "iteration": 1}));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 6 })
    );
    assert_eq!(session.state().agent_iteration(), Some(1));
}

#[tokio::test]
async fn test_decision_outside_review_sends_nothing() {
    let (mut session, mut peer, _connector) =
        open::<Value>(Endpoint::TopicGeneration, json!({"name": "Java"})).await;

    let outcome = session.submit_decision(Decision::approve()).await.unwrap();
    assert_eq!(
        outcome,
        DecisionOutcome::Ignored(IgnoreReason::NotAwaitingDecision(
            Phase::AwaitingFirstResponse
        ))
    );
    assert_eq!(session.state().phase(), Phase::AwaitingFirstResponse);

    peer.send_json(&json!({"type": "review", "content": ["a"]}));
    session.next_event().await.unwrap();
    session.submit_decision(Decision::reject()).await.unwrap();

    // The first frame after the parameters is the reject, nothing earlier
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"decision": "REJECT"})
    );
}

#[tokio::test]
async fn test_pending_feedback_is_sent_once() {
    let (mut session, mut peer, _connector) =
        open::<Value>(Endpoint::EpicReview, json!({"poc_details": "POC"})).await;

    peer.send_json(&json!({"type": "review", "content": "Epic draft"}));
    session.next_event().await.unwrap();

    session.set_feedback("split into two epics");
    session.submit_decision(Decision::refine("")).await.unwrap();
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"decision": "REFINE", "feedback": ""})
    );
    assert!(session.state().pending_feedback().is_none());

    peer.send_json(&json!({"type": "review", "content": "Epic draft 2"}));
    session.next_event().await.unwrap();
    session.set_feedback("shorter");
    session.submit_decision(Decision::reject()).await.unwrap();
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"decision": "REJECT", "feedback": "shorter"})
    );
}

#[tokio::test]
async fn test_unknown_and_malformed_frames_leave_phase() {
    let (mut session, peer, _connector) =
        open::<Value>(Endpoint::TopicGeneration, json!({"name": "Go"})).await;

    peer.send_text("this is not json");
    peer.send_json(&json!({"type": "heartbeat"}));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Ignored {
            tag: "heartbeat".to_string()
        })
    );
    assert_eq!(session.state().phase(), Phase::AwaitingFirstResponse);

    peer.send_json(&json!({"type": "review", "content": ["Goroutines"]}));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 1 })
    );
}

#[tokio::test]
async fn test_malformed_content_fails_session() {
    let (mut session, peer, _connector) =
        open::<TopicList>(Endpoint::TopicGeneration, json!({"name": "Go"})).await;

    peer.send_json(&json!({"type": "review", "content": 42}));
    match session.next_event().await {
        Some(SessionEvent::Failed(reason)) => assert_eq!(reason.kind, FailureKind::Content),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_capitalized_topic_levels_are_accepted() {
    let (mut session, peer, _connector) =
        open::<TopicList>(Endpoint::TopicGeneration, json!({"name": "Rust"})).await;

    peer.send_json(&json!({
        "type": "review",
        "content": [
            {"name": "Closures", "level": "Intermediate"},
            {"name": "Unsafe", "level": "Advanced"}
        ]
    }));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 1 })
    );
    let levels: Vec<Level> = session
        .content()
        .unwrap()
        .topics
        .iter()
        .map(|t| t.level)
        .collect();
    assert_eq!(levels, vec![Level::Intermediate, Level::Advanced]);
    assert_eq!(session.state().phase(), Phase::AwaitingDecision);
}

// ─── Channel lifecycle ───────────────────────────────────────────

#[tokio::test]
async fn test_agent_disconnect_fails_session() {
    let (mut session, mut peer, _connector) =
        open::<Value>(Endpoint::TopicGeneration, json!({"name": "Java"})).await;

    peer.send_json(&json!({"type": "review", "content": ["a"]}));
    session.next_event().await.unwrap();
    peer.close();

    match session.next_event().await {
        Some(SessionEvent::Failed(reason)) => assert_eq!(reason.kind, FailureKind::Transport),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(session.state().phase(), Phase::Failed);
    assert!(session.next_event().await.is_none());
}

#[tokio::test]
async fn test_link_error_fails_session() {
    let (mut session, mut peer, _connector) =
        open::<Value>(Endpoint::TopicGeneration, json!({"name": "Java"})).await;

    peer.fail("connection reset");
    match session.next_event().await {
        Some(SessionEvent::Failed(reason)) => {
            assert_eq!(reason.kind, FailureKind::Transport);
            assert!(reason.message.contains("connection reset"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_close_then_decision_is_dropped() {
    let (mut session, mut peer, _connector) =
        open::<Value>(Endpoint::TopicGeneration, json!({"name": "Java"})).await;

    peer.send_json(&json!({"type": "review", "content": ["a"]}));
    session.next_event().await.unwrap();

    session.close();
    let outcome = session.submit_decision(Decision::approve()).await.unwrap();
    assert_eq!(outcome, DecisionOutcome::Dropped);
    assert_eq!(session.state().phase(), Phase::AwaitingDecision);
    assert!(session.next_event().await.is_none());

    // Nothing but the close reaches the agent
    assert!(peer.recv_text().await.is_none());
}

#[tokio::test]
async fn test_reopen_starts_fresh_instance() {
    let connector = MemoryConnector::new();
    let mut session: ReviewSession<Value> =
        ReviewSession::new(Arc::new(connector.clone()), config(), Endpoint::TopicGeneration);

    let first_id = session.open(&json!({"name": "Java"})).await.unwrap();
    let old_peer = connector.accept().await.unwrap();
    old_peer.send_json(&json!({"type": "review", "content": ["old"]}));
    session.next_event().await.unwrap();
    assert_eq!(session.state().iteration(), 1);

    let second_id = session.open(&json!({"name": "Kotlin"})).await.unwrap();
    assert_ne!(first_id, second_id);
    assert_eq!(session.state().phase(), Phase::AwaitingFirstResponse);
    assert_eq!(session.state().iteration(), 0);
    assert!(session.content().is_none());

    let mut new_peer = connector.accept().await.unwrap();
    assert_eq!(new_peer.recv_json().await.unwrap(), json!({"name": "Kotlin"}));

    old_peer.send_json(&json!({"type": "error", "content": "stale"}));
    new_peer.send_json(&json!({"type": "review", "content": ["new"]}));

    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 1 })
    );
    assert_eq!(session.content(), Some(&json!(["new"])));
}

// ─── Persistence ─────────────────────────────────────────────────

#[tokio::test]
async fn test_quiz_persisted_on_approve() {
    let store = Arc::new(MemoryArtifactStore::new());
    let connector = MemoryConnector::new();
    let mut session: ReviewSession<Quiz> =
        ReviewSession::new(Arc::new(connector.clone()), config(), Endpoint::McqReview)
            .with_store(store.clone())
            .with_context(quiz_context());

    session.open_from_context().await.unwrap();
    let mut peer = connector.accept().await.unwrap();
    let params = peer.recv_json().await.unwrap();
    assert_eq!(params["tech_stack"], json!([{"id": 3, "name": "Java"}]));

    peer.send_json(&json!({"type": "review", "content": quiz_content(), "iteration": 1}));
    session.next_event().await.unwrap();
    assert_eq!(session.content().unwrap().len(), 1);

    let outcome = session.submit_decision(Decision::approve()).await.unwrap();
    let receipt = match outcome {
        DecisionOutcome::Persisted(receipt) => receipt,
        other => panic!("quiz was not persisted: {other:?}"),
    };
    assert_eq!(receipt.kind, ArtifactKind::Quiz);
    assert_eq!(receipt.id.as_deref(), Some("1"));
    assert_eq!(session.context().quiz_id.as_deref(), Some("1"));
    assert!(session.state().approval_pending());
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"decision": "APPROVE"})
    );

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].body["params"]["topics"], json!([11]));
    assert_eq!(
        records[0].body["questions"]["question1"]["correctAnswer"],
        "B"
    );

    // Final without content confirms the approved quiz
    peer.send_json(&json!({"type": "final"}));
    assert_eq!(session.next_event().await, Some(SessionEvent::Finalized));
    assert_eq!(session.content().unwrap().len(), 1);

    let mut context = session.into_context();
    assert_eq!(context.advance(), Some(WorkflowStep::DebugExercise));
    assert_eq!(context.quiz_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_persist_failure_keeps_phase() {
    let store = Arc::new(MemoryArtifactStore::failing("database unavailable"));
    let connector = MemoryConnector::new();
    let mut session: ReviewSession<ExerciseSet> =
        ReviewSession::new(Arc::new(connector.clone()), config(), Endpoint::DebugExercise)
            .with_store(store.clone())
            .with_context(quiz_context());

    session.open_from_context().await.unwrap();
    let mut peer = connector.accept().await.unwrap();
    peer.recv_json().await.unwrap();

    peer.send_json(&json!({
        "type": "review",
        "content": {"exercises": [{"title": "Off by one"}], "metadata": {}}
    }));
    session.next_event().await.unwrap();

    let err = session.submit_decision(Decision::approve()).await.unwrap_err();
    assert!(matches!(err, ReviewError::Persistence { .. }));
    assert_eq!(session.state().phase(), Phase::AwaitingFirstResponse);
    assert!(session.state().approval_pending());
    assert!(session.context().exercise_id.is_none());

    // The approval itself still went out
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"decision": "APPROVE"})
    );

    peer.send_json(&json!({"type": "final", "content": {"exercises": [{"title": "Off by one"}]}}));
    assert_eq!(session.next_event().await, Some(SessionEvent::Finalized));
}

#[tokio::test]
async fn test_without_store_approval_is_just_sent() {
    let (mut session, peer, _connector) =
        open::<TopicList>(Endpoint::TopicGeneration, json!({"name": "Rust"})).await;
    peer.send_json(&json!({
        "type": "review",
        "content": [{"name": "Ownership", "level": "beginner"}]
    }));
    session.next_event().await.unwrap();

    let outcome = session.submit_decision(Decision::approve()).await.unwrap();
    assert_eq!(outcome, DecisionOutcome::Sent);
}

// ─── Hands-on (action dialect) ───────────────────────────────────

#[tokio::test]
async fn test_handson_suggest_approve_and_store_on_final() {
    let store = Arc::new(MemoryArtifactStore::new());
    let connector = MemoryConnector::new();
    let context = WorkflowContext::new()
        .with_tech_stack(3, "Java")
        .with_topic(11, "Streams", Level::Advanced)
        .with_duration(2);
    let mut session: ReviewSession<HandsOnProject> =
        ReviewSession::new(Arc::new(connector.clone()), config(), Endpoint::CreateHandson)
            .with_store(store.clone())
            .with_context(context);

    session.open_from_context().await.unwrap();
    let mut peer = connector.accept().await.unwrap();
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"tech_stack": "Java", "topics": ["Streams"], "duration": 2})
    );

    peer.send_json(&json!({
        "type": "srs_review",
        "srs_md": "# SRS v1",
        "regen_count": 0,
        "max_regen": 3
    }));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 1 })
    );
    assert_eq!(session.state().max_iterations(), Some(3));
    assert_eq!(
        session.content().unwrap().srs_md.as_deref(),
        Some("# SRS v1")
    );

    session
        .submit_decision(Decision::feedback("add auth,\nadd tests"))
        .await
        .unwrap();
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"action": "suggest", "suggestions": ["add auth", "add tests"]})
    );

    peer.send_json(&json!({
        "type": "srs_review",
        "srs_md": "# SRS v2",
        "regen_count": 1,
        "max_regen": 3
    }));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 2 })
    );

    let outcome = session.submit_decision(Decision::approve()).await.unwrap();
    assert_eq!(outcome, DecisionOutcome::Sent);
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"action": "approve"})
    );
    assert!(store.records().is_empty());

    peer.send_json(&json!({"type": "status", "content": "README generated."}));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Status("README generated.".to_string()))
    );

    peer.send_json(&json!({
        "type": "final",
        "content": {
            "tech_stack": "Java",
            "topics": ["Streams"],
            "duration": 2,
            "path_id": "p-42",
            "srs_md": "# SRS v2",
            "boilerplate_files": ["Main.java"]
        }
    }));
    assert_eq!(session.next_event().await, Some(SessionEvent::Finalized));
    match session.next_event().await {
        Some(SessionEvent::Persisted(receipt)) => {
            assert_eq!(receipt.kind, ArtifactKind::HandsOn);
            assert_eq!(receipt.id.as_deref(), Some("1"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(session.context().handson_id.as_deref(), Some("1"));
    assert_eq!(store.records()[0].body["path_id"], "p-42");
}

#[tokio::test]
async fn test_handson_store_failure_keeps_finalized() {
    let connector = MemoryConnector::new();
    let mut session: ReviewSession<HandsOnProject> =
        ReviewSession::new(Arc::new(connector.clone()), config(), Endpoint::CreateHandson)
            .with_store(Arc::new(MemoryArtifactStore::failing("disk full")));

    session
        .open(&json!({"tech_stack": "Java", "topics": [], "duration": 1}))
        .await
        .unwrap();
    let peer = connector.accept().await.unwrap();

    peer.send_json(&json!({"type": "final", "content": {"path_id": "p-1", "srs_md": "# SRS"}}));
    assert_eq!(session.next_event().await, Some(SessionEvent::Finalized));
    match session.next_event().await {
        Some(SessionEvent::PersistFailed(reason)) => assert!(reason.contains("disk full")),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(session.state().phase(), Phase::Finalized);
}

// ─── Approval without a final round trip ─────────────────────────

fn unconfirmed(style: DecisionStyle) -> Endpoint {
    Endpoint::Custom {
        path: "/ws/quick-review".to_string(),
        dialect: Dialect {
            style,
            approval_round_trip: false,
        },
    }
}

#[tokio::test]
async fn test_unconfirmed_approval_finalizes_and_stores() {
    let store = Arc::new(MemoryArtifactStore::new());
    let connector = MemoryConnector::new();
    let mut session: ReviewSession<HandsOnProject> = ReviewSession::new(
        Arc::new(connector.clone()),
        config(),
        unconfirmed(DecisionStyle::Action),
    )
    .with_store(store.clone())
    .with_context(WorkflowContext::new().with_tech_stack(3, "Java"));

    session.open(&json!({"tech_stack": "Java"})).await.unwrap();
    let mut peer = connector.accept().await.unwrap();
    peer.recv_json().await.unwrap();

    peer.send_json(&json!({
        "type": "review",
        "content": {"path_id": "p-7", "srs_md": "# SRS"}
    }));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 1 })
    );

    let outcome = session.submit_decision(Decision::approve()).await.unwrap();
    assert_eq!(outcome, DecisionOutcome::Sent);
    assert_eq!(peer.recv_json().await.unwrap(), json!({"action": "approve"}));
    assert_eq!(session.state().phase(), Phase::Finalized);

    assert_eq!(session.next_event().await, Some(SessionEvent::Finalized));
    match session.next_event().await {
        Some(SessionEvent::Persisted(receipt)) => {
            assert_eq!(receipt.kind, ArtifactKind::HandsOn);
            assert_eq!(receipt.id.as_deref(), Some("1"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(session.next_event().await.is_none());

    assert_eq!(store.records().len(), 1);
    assert_eq!(store.records()[0].body["path_id"], "p-7");
    assert_eq!(session.context().handson_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_unconfirmed_approval_stores_approved_quiz_once() {
    let store = Arc::new(MemoryArtifactStore::new());
    let connector = MemoryConnector::new();
    let mut session: ReviewSession<Quiz> = ReviewSession::new(
        Arc::new(connector.clone()),
        config(),
        unconfirmed(DecisionStyle::Verdict),
    )
    .with_store(store.clone())
    .with_context(quiz_context());

    session.open(&json!({})).await.unwrap();
    let mut peer = connector.accept().await.unwrap();
    peer.recv_json().await.unwrap();

    peer.send_json(&json!({"type": "review", "content": quiz_content()}));
    session.next_event().await.unwrap();

    let outcome = session.submit_decision(Decision::approve()).await.unwrap();
    assert!(matches!(outcome, DecisionOutcome::Persisted(_)));
    assert_eq!(session.next_event().await, Some(SessionEvent::Finalized));
    assert!(session.next_event().await.is_none());
    assert_eq!(store.records().len(), 1);
    assert_eq!(session.context().quiz_id.as_deref(), Some("1"));
}

// ─── Debug-gen (selection dialect) ───────────────────────────────

#[tokio::test]
async fn test_debug_gen_selection_flow() {
    let (mut session, mut peer, _connector) = open::<ProjectBrief>(
        Endpoint::DebugGen,
        json!({
            "test_id": 7,
            "tech_stack": "Python",
            "topics": ["Loops"],
            "difficulty": "beginner",
            "duration": 1
        }),
    )
    .await;

    peer.send_json(&json!({
        "type": "brd_review",
        "brd": "Library management system",
        "initial_topics": ["Loops"],
        "suggested_topics": [{"topic": "Dictionaries", "reason": "lookup bugs"}]
    }));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Review { iteration: 1 })
    );
    let brief = session.content().unwrap();
    assert_eq!(brief.brd.as_deref(), Some("Library management system"));
    assert_eq!(brief.all_topics(), vec!["Loops", "Dictionaries"]);

    let outcome = session.submit_decision(Decision::reject()).await.unwrap();
    assert_eq!(outcome, DecisionOutcome::Ignored(IgnoreReason::Unsupported));
    assert_eq!(session.state().phase(), Phase::AwaitingDecision);

    let outcome = session
        .submit_decision(Decision::approve().with_selection(["Loops", "Dictionaries"]))
        .await
        .unwrap();
    assert_eq!(outcome, DecisionOutcome::Sent);
    assert_eq!(
        peer.recv_json().await.unwrap(),
        json!({"final_topics": ["Loops", "Dictionaries"], "feedback": ""})
    );

    peer.send_json(&json!({"type": "accepted"}));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Status("accepted".to_string()))
    );

    peer.send_json(&json!({"type": "final_id", "debug_exercise": 42}));
    assert_eq!(session.next_event().await, Some(SessionEvent::Finalized));
    assert_eq!(session.context().exercise_id.as_deref(), Some("42"));

    peer.send_json(&json!({"type": "project_generated", "content": "done"}));
    assert_eq!(
        session.next_event().await,
        Some(SessionEvent::Discarded {
            tag: "project_generated".to_string()
        })
    );
}

#[tokio::test]
async fn test_memory_store_is_an_artifact_store() {
    let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());
    assert_eq!(store.name(), "memory");
}
