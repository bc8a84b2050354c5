// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end turn tests over mock adapters.

use recall_agent::{AgentState, TurnOutcome};
use recall_core::{ContentBlock, RecallError, Role};
use recall_test_utils::{MockReply, StoreFailure, TestHarness, row};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

const LEAD_IN: &str = "Here's some additional information you can use to answer the question: ";

fn roles(harness: &TestHarness) -> Vec<Role> {
    harness
        .orchestrator
        .history()
        .iter()
        .map(|t| t.role)
        .collect()
}

#[tokio::test]
async fn relevant_memory_is_injected_before_the_user_turn() {
    let mut harness = TestHarness::builder()
        .with_memory("p1", "Premiums rose 15% in Sept 2024")
        .with_memory("s1", "Safety Score monitors driving")
        .with_replies([MockReply::chunks(&["Premiums ", "rose 15%."])])
        .build()
        .await
        .unwrap();

    let (outcome, tokens) = harness.send("How much did premiums rise?").await.unwrap();

    assert_eq!(
        outcome,
        TurnOutcome::Committed {
            answer: "Premiums rose 15%.".into()
        }
    );
    assert_eq!(tokens, vec!["Premiums ", "rose 15%."]);
    assert_eq!(
        roles(&harness),
        vec![Role::System, Role::Context, Role::User, Role::Assistant]
    );
    let history = harness.orchestrator.history();
    assert_eq!(
        history[1].content,
        format!("{LEAD_IN}Premiums rose 15% in Sept 2024")
    );
    assert_eq!(history[2].content, "How much did premiums rise?");

    let requests = harness.provider.requests();
    assert_eq!(requests.len(), 1);
    let messages = &requests[0].messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, "system");
    assert!(messages[1].text_content().contains("Premiums rose 15%"));
    assert_eq!(messages[2].role, "user");
    assert!(requests[0].stream);
    assert_eq!(harness.orchestrator.state(), AgentState::Idle);
}

#[tokio::test]
async fn irrelevant_question_adds_exactly_two_turns() {
    let mut harness = TestHarness::builder()
        .with_memory("p1", "Premiums rose 15% in Sept 2024")
        .build()
        .await
        .unwrap();

    let answer = harness.send_message("What's the weather?").await.unwrap();

    assert_eq!(answer, "mock response");
    assert_eq!(roles(&harness), vec![Role::System, Role::User, Role::Assistant]);
    assert_eq!(harness.provider.requests()[0].messages.len(), 2);
}

#[tokio::test]
async fn earlier_turns_are_resent_on_the_next_turn() {
    let mut harness = TestHarness::builder()
        .with_memory("p1", "Premiums rose 15% in Sept 2024")
        .build()
        .await
        .unwrap();

    harness.send_message("premium change?").await.unwrap();
    harness.send_message("thanks").await.unwrap();

    let requests = harness.provider.requests();
    // system, context, user, assistant, user
    assert_eq!(requests[1].messages.len(), 5);
    assert_eq!(harness.orchestrator.history().len(), 6);
}

#[tokio::test]
async fn blank_memory_text_never_becomes_a_context_turn() {
    let mut harness = TestHarness::builder()
        .with_memory("blank", "   ")
        .with_min_relevance(-1.0)
        .with_lead_in("")
        .build()
        .await
        .unwrap();

    let answer = harness.send_message("premium question").await.unwrap();

    assert_eq!(answer, "mock response");
    assert_eq!(roles(&harness), vec![Role::System, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let mut harness = TestHarness::builder().build().await.unwrap();

    let (outcome, tokens) = harness.send("   \n").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Ignored);
    assert!(tokens.is_empty());
    assert_eq!(harness.orchestrator.history().len(), 1);
    assert!(harness.provider.requests().is_empty());
    assert_eq!(harness.embedder.calls(), 0);
}

#[tokio::test]
async fn no_content_leaves_transcript_unchanged() {
    let mut harness = TestHarness::builder()
        .with_replies([MockReply::NoContent])
        .build()
        .await
        .unwrap();

    let err = harness.send("hello").await.unwrap_err();

    assert!(matches!(err, RecallError::NoContent));
    assert_eq!(harness.orchestrator.history().len(), 1);
    assert_eq!(harness.orchestrator.state(), AgentState::Idle);
}

#[tokio::test]
async fn completion_failure_ends_only_the_current_turn() {
    let mut harness = TestHarness::builder()
        .with_replies([MockReply::Error("502 bad gateway".into())])
        .build()
        .await
        .unwrap();

    let err = harness.send("hello").await.unwrap_err();
    assert!(matches!(err, RecallError::CompletionUnavailable { .. }));
    assert_eq!(harness.orchestrator.history().len(), 1);

    let answer = harness.send_message("hello again").await.unwrap();
    assert_eq!(answer, "mock response");
    assert_eq!(harness.orchestrator.history().len(), 3);
}

#[tokio::test]
async fn cancellation_mid_stream_discards_the_turn() {
    let mut harness = TestHarness::builder()
        .with_replies([MockReply::Hang(vec!["partial ".into(), "answer".into()])])
        .build()
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mut seen = Vec::new();
    let outcome = harness
        .orchestrator
        .handle_turn("tell me a story", &cancel, &mut |t: &str| {
            seen.push(t.to_string());
            trigger.cancel();
        })
        .await
        .unwrap();

    assert_eq!(outcome, TurnOutcome::Cancelled);
    assert_eq!(seen, vec!["partial "]);
    assert_eq!(harness.orchestrator.history().len(), 1);
    assert_eq!(harness.orchestrator.state(), AgentState::Idle);
}

#[tokio::test]
async fn cancelled_before_start_makes_no_calls() {
    let mut harness = TestHarness::builder().build().await.unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = harness
        .orchestrator
        .handle_turn("hello", &cancel, &mut |_: &str| {})
        .await
        .unwrap();

    assert_eq!(outcome, TurnOutcome::Cancelled);
    assert!(harness.provider.requests().is_empty());
    assert_eq!(harness.orchestrator.history().len(), 1);
}

#[tokio::test]
#[traced_test]
async fn retrieval_outage_answers_without_context() {
    let mut harness = TestHarness::builder()
        .with_memory("p1", "Premiums rose 15% in Sept 2024")
        .build()
        .await
        .unwrap();
    harness.embedder.set_failing(true);

    let answer = harness.send_message("premium change?").await.unwrap();

    assert_eq!(answer, "mock response");
    assert_eq!(roles(&harness), vec![Role::System, Role::User, Role::Assistant]);
    assert!(logs_contain("memory search failed"));
}

#[tokio::test]
#[traced_test]
async fn empty_answer_is_committed_with_a_warning() {
    let mut harness = TestHarness::builder()
        .with_replies([MockReply::chunks(&[""])])
        .build()
        .await
        .unwrap();

    let answer = harness.send_message("hello").await.unwrap();

    assert_eq!(answer, "");
    let history = harness.orchestrator.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].role, Role::Assistant);
    assert!(history[2].content.is_empty());
    assert!(logs_contain("empty answer"));
}

#[tokio::test]
async fn clear_history_keeps_only_the_system_turn() {
    let mut harness = TestHarness::builder()
        .with_system_prompt("Be brief.")
        .build()
        .await
        .unwrap();
    harness.send_message("one").await.unwrap();
    harness.send_message("two").await.unwrap();
    assert_eq!(harness.orchestrator.history().len(), 5);

    harness.orchestrator.clear_history();

    let history = harness.orchestrator.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::System);
    assert_eq!(history[0].content, "Be brief.");
}

#[tokio::test]
async fn query_tool_result_is_fed_back_to_the_model() {
    let mut harness = TestHarness::builder()
        .with_query_tools()
        .with_replies([
            MockReply::tool_call(
                "call_1",
                "query_database",
                json!({"request": "How many sessions are there?"}),
            ),
            MockReply::text("```sql\nSELECT COUNT(*) AS n FROM sessions\n```"),
            MockReply::text("There are 42 sessions."),
        ])
        .build()
        .await
        .unwrap();
    harness.store.push_rows(vec![row(&[("n", json!(42))])]);

    let answer = harness.send_message("How many sessions are there?").await.unwrap();

    assert_eq!(answer, "There are 42 sessions.");
    assert_eq!(
        harness.store.queries(),
        vec!["SELECT COUNT(*) AS n FROM sessions"]
    );

    let requests = harness.provider.requests();
    assert_eq!(requests.len(), 3);
    let tool_names: Vec<String> = requests[0]
        .tools
        .as_ref()
        .unwrap()
        .iter()
        .map(|t| t.name.clone())
        .collect();
    assert_eq!(tool_names, vec!["find_similar_sessions", "query_database"]);

    // The query generation call is isolated from the conversation.
    assert_eq!(requests[1].messages.len(), 2);
    assert!(requests[1].tools.is_none());

    let followup = &requests[2].messages;
    let result = followup
        .last()
        .unwrap()
        .content
        .iter()
        .find_map(|b| match b {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => Some((tool_use_id.clone(), content.clone(), *is_error)),
            _ => None,
        })
        .unwrap();
    assert_eq!(result.0, "call_1");
    assert!(result.1.contains("42"));
    assert!(!result.2);

    assert_eq!(roles(&harness), vec![Role::System, Role::User, Role::Assistant]);
}

#[tokio::test]
#[traced_test]
async fn tool_failure_becomes_a_note_and_the_turn_continues() {
    let mut harness = TestHarness::builder()
        .with_query_tools()
        .with_replies([
            MockReply::tool_call("call_1", "query_database", json!({"request": "count"})),
            MockReply::text("SELECT COUNT(*) FROM sessions"),
            MockReply::text("The database is unavailable right now."),
        ])
        .build()
        .await
        .unwrap();
    harness.store.push_failure(StoreFailure::Unavailable);

    let answer = harness.send_message("count the sessions").await.unwrap();

    assert_eq!(answer, "The database is unavailable right now.");
    assert_eq!(
        roles(&harness),
        vec![Role::System, Role::User, Role::Context, Role::Assistant]
    );
    let note = &harness.orchestrator.history()[2].content;
    assert!(note.starts_with("Tool query_database failed:"));
    assert!(logs_contain("tool call failed"));

    let requests = harness.provider.requests();
    let last = requests[2].messages.last().unwrap();
    assert!(last.content.iter().any(|b| matches!(
        b,
        ContentBlock::ToolResult { is_error: true, .. }
    )));
}

#[tokio::test]
async fn unknown_tool_is_reported_back_to_the_model() {
    let mut harness = TestHarness::builder()
        .with_query_tools()
        .with_replies([
            MockReply::tool_call("call_9", "delete_everything", json!({})),
            MockReply::text("I can't do that."),
        ])
        .build()
        .await
        .unwrap();

    let answer = harness.send_message("wipe it").await.unwrap();

    assert_eq!(answer, "I can't do that.");
    let note = &harness.orchestrator.history()[2].content;
    assert!(note.contains("delete_everything"));
}

#[tokio::test]
#[traced_test]
async fn tool_loop_stops_at_the_iteration_limit() {
    let mut harness = TestHarness::builder()
        .with_query_tools()
        .with_max_tool_iterations(1)
        .with_replies([
            MockReply::tool_call("call_1", "find_similar_sessions", json!({"topic": "rust"})),
            MockReply::tool_call("call_2", "find_similar_sessions", json!({"topic": "rust"})),
        ])
        .build()
        .await
        .unwrap();

    let answer = harness.send_message("sessions about rust").await.unwrap();

    assert_eq!(answer, "");
    let requests = harness.provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].tools.is_some());
    assert!(requests[1].tools.is_none());
    assert_eq!(harness.store.procedure_calls().len(), 1);
    assert!(logs_contain("maximum tool iterations reached"));
}
