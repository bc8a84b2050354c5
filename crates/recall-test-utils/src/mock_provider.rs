// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion service for deterministic testing.
//!
//! Replies are popped from a FIFO queue shared by `complete` and `stream`.
//! When the queue is empty, the text "mock response" is returned.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use recall_core::{
    PluginAdapter, ProviderAdapter, ProviderRequest, ProviderResponse, ProviderStream,
    ProviderStreamChunk, RecallError, StreamEventType, TokenUsage, ToolUseData,
};

use crate::lock;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A single text fragment.
    Text(String),
    /// Several fragments, streamed in order.
    Chunks(Vec<String>),
    /// A tool call and no text.
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// No content object at all.
    NoContent,
    /// The endpoint fails with `CompletionUnavailable`.
    Error(String),
    /// Streams the fragments, then never finishes.
    Hang(Vec<String>),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }

    pub fn chunks(chunks: &[&str]) -> Self {
        MockReply::Chunks(chunks.iter().map(|c| c.to_string()).collect())
    }

    pub fn tool_call(id: &str, name: &str, input: serde_json::Value) -> Self {
        MockReply::ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }
    }
}

/// A completion service that replays scripted replies and records requests.
#[derive(Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<ProviderRequest>>,
    shut_down: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Queues a reply.
    pub fn push(&self, reply: MockReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        lock(&self.requests).clone()
    }

    /// True once `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn next_reply(&self, request: ProviderRequest) -> MockReply {
        lock(&self.requests).push(request);
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| MockReply::text("mock response"))
    }
}

fn usage() -> TokenUsage {
    TokenUsage {
        input_tokens: 10,
        output_tokens: 20,
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, RecallError> {
        let model = request.model.clone();
        let (content, stop_reason) = match self.next_reply(request) {
            MockReply::Text(text) => (Some(text), "stop"),
            MockReply::Chunks(chunks) => (Some(chunks.concat()), "stop"),
            MockReply::ToolCall { .. } => (None, "tool_calls"),
            MockReply::NoContent => (None, "stop"),
            MockReply::Error(message) => return Err(RecallError::completion(message)),
            MockReply::Hang(_) => futures::future::pending().await,
        };
        Ok(ProviderResponse {
            id: "mock-resp".to_string(),
            content,
            model,
            stop_reason: Some(stop_reason.to_string()),
            usage: Some(usage()),
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, RecallError> {
        let start = Ok(ProviderStreamChunk::event(StreamEventType::MessageStart));
        let finish = |stop_reason: &str| {
            vec![
                Ok(ProviderStreamChunk {
                    usage: Some(usage()),
                    stop_reason: Some(stop_reason.to_string()),
                    ..ProviderStreamChunk::event(StreamEventType::MessageDelta)
                }),
                Ok(ProviderStreamChunk {
                    stop_reason: Some(stop_reason.to_string()),
                    ..ProviderStreamChunk::event(StreamEventType::MessageStop)
                }),
            ]
        };

        let chunks: Vec<Result<ProviderStreamChunk, RecallError>> =
            match self.next_reply(request) {
                MockReply::Text(text) => {
                    let mut v = vec![start, Ok(ProviderStreamChunk::text(text))];
                    v.extend(finish("stop"));
                    v
                }
                MockReply::Chunks(chunks) => {
                    let mut v = vec![start];
                    v.extend(chunks.into_iter().map(|c| Ok(ProviderStreamChunk::text(c))));
                    v.extend(finish("stop"));
                    v
                }
                MockReply::ToolCall { id, name, input } => {
                    let mut v = vec![
                        start,
                        Ok(ProviderStreamChunk {
                            tool_use: Some(ToolUseData { id, name, input }),
                            ..ProviderStreamChunk::event(StreamEventType::ContentBlockStop)
                        }),
                    ];
                    v.extend(finish("tool_calls"));
                    v
                }
                MockReply::NoContent => {
                    let mut v = vec![start];
                    v.extend(finish("stop"));
                    v
                }
                MockReply::Error(message) => return Err(RecallError::completion(message)),
                MockReply::Hang(chunks) => {
                    let mut v = vec![start];
                    v.extend(chunks.into_iter().map(|c| Ok(ProviderStreamChunk::text(c))));
                    return Ok(Box::pin(stream::iter(v).chain(stream::pending())));
                }
            };

        Ok(Box::pin(stream::iter(chunks)))
    }
}
