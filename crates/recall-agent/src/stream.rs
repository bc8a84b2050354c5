// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fold of a provider stream into one generation result.
//!
//! Chunks are applied strictly in arrival order. Cancellation short-circuits
//! the fold and drops the accumulator without publishing it.

use futures::StreamExt;
use recall_core::{ProviderStream, RecallError, StreamEventType, TokenUsage, ToolUseData};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Everything one streamed generation produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Concatenation of every text fragment in arrival order.
    pub text: String,
    /// Completed tool calls in arrival order.
    pub tool_calls: Vec<ToolUseData>,
    /// True once any content delta (even an empty one) or tool call arrived.
    pub has_content: bool,
    pub stop_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// How a fold ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FoldOutcome {
    Completed(Generation),
    Cancelled,
}

/// Consumes `stream`, passing each text fragment to `on_token` as it arrives.
///
/// Returns [`FoldOutcome::Cancelled`] as soon as `cancel` fires. An error
/// chunk or stream error ends the fold with
/// [`RecallError::CompletionUnavailable`].
pub async fn fold_stream(
    mut stream: ProviderStream,
    cancel: &CancellationToken,
    on_token: &mut (dyn FnMut(&str) + Send),
) -> Result<FoldOutcome, RecallError> {
    let mut acc = Generation::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(discarded_bytes = acc.text.len(), "stream cancelled");
                return Ok(FoldOutcome::Cancelled);
            }
            next = stream.next() => next,
        };

        let Some(result) = next else {
            break;
        };
        let chunk = result?;

        match chunk.event_type {
            StreamEventType::ContentBlockDelta => {
                if let Some(text) = chunk.text {
                    acc.has_content = true;
                    if !text.is_empty() {
                        on_token(&text);
                        acc.text.push_str(&text);
                    }
                }
            }
            StreamEventType::ContentBlockStop => {
                if let Some(tool_use) = chunk.tool_use {
                    acc.has_content = true;
                    acc.tool_calls.push(tool_use);
                }
            }
            StreamEventType::MessageStart | StreamEventType::MessageDelta => {
                if chunk.usage.is_some() {
                    acc.usage = chunk.usage;
                }
                if chunk.stop_reason.is_some() {
                    acc.stop_reason = chunk.stop_reason;
                }
            }
            StreamEventType::MessageStop => {
                if chunk.stop_reason.is_some() {
                    acc.stop_reason = chunk.stop_reason;
                }
            }
            StreamEventType::Error => {
                return Err(RecallError::completion(
                    chunk.error.unwrap_or_else(|| "stream error".into()),
                ));
            }
        }
    }

    Ok(FoldOutcome::Completed(acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use recall_core::ProviderStreamChunk;

    fn boxed(chunks: Vec<Result<ProviderStreamChunk, RecallError>>) -> ProviderStream {
        Box::pin(stream::iter(chunks))
    }

    fn completed(outcome: FoldOutcome) -> Generation {
        match outcome {
            FoldOutcome::Completed(generation) => generation,
            FoldOutcome::Cancelled => panic!("unexpected cancellation"),
        }
    }

    #[tokio::test]
    async fn concatenates_in_arrival_order() {
        let chunks = vec![
            Ok(ProviderStreamChunk::event(StreamEventType::MessageStart)),
            Ok(ProviderStreamChunk::text("Prem")),
            Ok(ProviderStreamChunk::text("")),
            Ok(ProviderStreamChunk::text("iums ro")),
            Ok(ProviderStreamChunk::text("se.")),
            Ok(ProviderStreamChunk::event(StreamEventType::MessageStop)),
        ];
        let mut seen = Vec::new();
        let outcome = fold_stream(boxed(chunks), &CancellationToken::new(), &mut |t: &str| {
            seen.push(t.to_string())
        })
        .await
        .unwrap();

        let generation = completed(outcome);
        assert_eq!(generation.text, "Premiums rose.");
        assert!(generation.has_content);
        assert_eq!(seen, vec!["Prem", "iums ro", "se."]);
    }

    #[tokio::test]
    async fn only_empty_delta_still_counts_as_content() {
        let chunks = vec![Ok(ProviderStreamChunk::text(""))];
        let generation = completed(
            fold_stream(boxed(chunks), &CancellationToken::new(), &mut |_: &str| {})
                .await
                .unwrap(),
        );
        assert!(generation.has_content);
        assert_eq!(generation.text, "");
    }

    #[tokio::test]
    async fn no_delta_means_no_content() {
        let chunks = vec![
            Ok(ProviderStreamChunk::event(StreamEventType::MessageStart)),
            Ok(ProviderStreamChunk::event(StreamEventType::MessageStop)),
        ];
        let generation = completed(
            fold_stream(boxed(chunks), &CancellationToken::new(), &mut |_: &str| {})
                .await
                .unwrap(),
        );
        assert!(!generation.has_content);
    }

    #[tokio::test]
    async fn collects_tool_calls() {
        let chunks = vec![
            Ok(ProviderStreamChunk {
                tool_use: Some(ToolUseData {
                    id: "call_1".into(),
                    name: "query_database".into(),
                    input: serde_json::json!({"request": "x"}),
                }),
                ..ProviderStreamChunk::event(StreamEventType::ContentBlockStop)
            }),
            Ok(ProviderStreamChunk {
                stop_reason: Some("tool_calls".into()),
                ..ProviderStreamChunk::event(StreamEventType::MessageStop)
            }),
        ];
        let generation = completed(
            fold_stream(boxed(chunks), &CancellationToken::new(), &mut |_: &str| {})
                .await
                .unwrap(),
        );
        assert_eq!(generation.tool_calls.len(), 1);
        assert_eq!(generation.stop_reason.as_deref(), Some("tool_calls"));
    }

    #[tokio::test]
    async fn error_chunk_is_completion_unavailable() {
        let chunks = vec![
            Ok(ProviderStreamChunk::text("partial")),
            Ok(ProviderStreamChunk {
                error: Some("server_error: overloaded".into()),
                ..ProviderStreamChunk::event(StreamEventType::Error)
            }),
        ];
        let err = fold_stream(boxed(chunks), &CancellationToken::new(), &mut |_: &str| {})
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::CompletionUnavailable { .. }));
    }

    #[tokio::test]
    async fn cancellation_discards_accumulator() {
        let cancel = CancellationToken::new();
        let head = stream::iter(vec![Ok(ProviderStreamChunk::text("half an answ"))]);
        let stream: ProviderStream = Box::pin(head.chain(stream::pending()));

        let trigger = cancel.clone();
        let outcome = fold_stream(stream, &cancel, &mut move |_: &str| trigger.cancel())
            .await
            .unwrap();
        assert_eq!(outcome, FoldOutcome::Cancelled);
    }
}
