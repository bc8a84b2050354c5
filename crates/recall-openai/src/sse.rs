// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for streamed chat completions.
//!
//! OpenAI sends unnamed `data:` events carrying [`ChatChunk`] JSON and a
//! final `data: [DONE]` sentinel.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use recall_core::RecallError;

use crate::types::{ApiErrorResponse, ChatChunk};

/// Typed SSE events from a streamed completion.
#[derive(Debug, Clone)]
pub enum SseEvent {
    Chunk(ChatChunk),
    /// The `[DONE]` sentinel.
    Done,
}

/// Parses a reqwest streaming response into a stream of [`SseEvent`]s.
///
/// An error payload mid-stream surfaces as `Err`. Empty keep-alive events
/// are skipped.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<SseEvent, RecallError>> + Send>> {
    let event_stream = response.bytes_stream().eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => parse_event_data(&event.data),
            Err(e) => Some(Err(RecallError::completion(format!("SSE stream error: {e}")))),
        }
    });

    Box::pin(mapped)
}

fn parse_event_data(data: &str) -> Option<Result<SseEvent, RecallError>> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(Ok(SseEvent::Done));
    }
    if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(data) {
        return Some(Err(RecallError::completion(format!(
            "OpenAI stream error ({}): {}",
            api_err.error.kind(),
            api_err.error.message
        ))));
    }
    Some(
        serde_json::from_str::<ChatChunk>(data)
            .map(SseEvent::Chunk)
            .map_err(|e| RecallError::CompletionUnavailable {
                message: format!("failed to parse stream chunk: {e}"),
                source: Some(Box::new(e)),
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serves `sse_text` from wiremock to get a real `reqwest::Response`.
    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;

        reqwest::get(&server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn parses_chunks_and_done() {
        let sse = concat!(
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let response = mock_sse_response(sse).await;
        let events: Vec<_> = parse_sse_stream(response).collect().await;

        assert_eq!(events.len(), 3);
        match events[1].as_ref().unwrap() {
            SseEvent::Chunk(chunk) => {
                assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));
            }
            other => panic!("expected chunk, got {other:?}"),
        }
        assert!(matches!(events[2], Ok(SseEvent::Done)));
    }

    #[tokio::test]
    async fn error_payload_becomes_err() {
        let sse = "data: {\"error\":{\"message\":\"content filtered\",\"type\":\"server_error\"}}\n\n";
        let response = mock_sse_response(sse).await;
        let events: Vec<_> = parse_sse_stream(response).collect().await;

        assert_eq!(events.len(), 1);
        let err = events[0].as_ref().unwrap_err();
        assert!(err.to_string().contains("content filtered"));
    }

    #[tokio::test]
    async fn malformed_chunk_is_an_error() {
        let response = mock_sse_response("data: {not json\n\n").await;
        let events: Vec<_> = parse_sse_stream(response).collect().await;
        assert!(events[0].is_err());
    }

    #[test]
    fn blank_data_is_skipped() {
        assert!(parse_event_data("  ").is_none());
    }
}
