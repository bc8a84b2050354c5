// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the recall workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// --- Transcript types ---

/// Role of a [`Turn`] in the transcript.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Retrieved knowledge or tool notes injected for the model only.
    Context,
}

/// One message in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Converts the turn into the provider wire shape.
    ///
    /// Context turns are sent with the `system` role.
    pub fn to_provider_message(&self) -> ProviderMessage {
        let role = match self.role {
            Role::System | Role::Context => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        ProviderMessage::text(role, self.content.clone())
    }
}

// --- Provider types ---

/// A block of content within a provider message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },
    /// A tool call requested by the model.
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// The output of a tool call, sent back to the model.
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

/// A message in a provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// `system`, `user`, or `assistant`.
    pub role: String,
    pub content: Vec<ContentBlock>,
}

impl ProviderMessage {
    /// A message holding a single text block.
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Concatenates the text blocks of this message.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Declarative description of a callable tool handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool arguments.
    pub parameters: serde_json::Value,
}

/// A request to an LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Model or deployment name.
    pub model: String,
    pub messages: Vec<ProviderMessage>,
    pub max_tokens: u32,
    pub stream: bool,
    /// Tools the model may call on its own decision.
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A non-streaming response from an LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub id: String,
    /// `None` when the service returned no content object at all.
    pub content: Option<String>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Kind of a streamed provider event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEventType {
    MessageStart,
    ContentBlockDelta,
    /// A completed tool call (arguments fully assembled).
    ContentBlockStop,
    MessageDelta,
    MessageStop,
    Error,
}

/// A tool call assembled from streamed deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolUseData {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// A single chunk from a streaming provider response.
#[derive(Debug, Clone)]
pub struct ProviderStreamChunk {
    pub event_type: StreamEventType,
    /// Text fragment; may be empty. Only set on `ContentBlockDelta`.
    pub text: Option<String>,
    /// Optional role metadata.
    pub role: Option<String>,
    pub usage: Option<TokenUsage>,
    pub error: Option<String>,
    pub tool_use: Option<ToolUseData>,
    pub stop_reason: Option<String>,
}

impl ProviderStreamChunk {
    /// A chunk of the given type with every payload field empty.
    pub fn event(event_type: StreamEventType) -> Self {
        Self {
            event_type,
            text: None,
            role: None,
            usage: None,
            error: None,
            tool_use: None,
            stop_reason: None,
        }
    }

    /// A content delta carrying `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::event(StreamEventType::ContentBlockDelta)
        }
    }
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter, one vector per input text in order.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

// --- Relational types ---

/// Shape of the rows a query tool hands back to the model.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResultShape {
    /// Whatever columns the generated query selects.
    #[default]
    DynamicRows,
    /// A fixed record type known ahead of time.
    TypedRecords,
}

/// One row from the relational store, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Named parameters for a procedure call.
pub type NamedParams = std::collections::BTreeMap<String, serde_json::Value>;
