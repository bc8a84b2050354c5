// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for recall, a retrieval-augmented conversational agent.
//!
//! This crate provides the error taxonomy, the transcript and provider wire
//! types, and the adapter traits for the three external services: the
//! completion service, the embedding service, and the relational store.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RecallError;
pub use types::{
    ContentBlock, EmbeddingInput, EmbeddingOutput, NamedParams, ProviderMessage, ProviderRequest,
    ProviderResponse, ProviderStreamChunk, ResultShape, Role, Row, StreamEventType, TokenUsage,
    ToolDefinition, ToolUseData, Turn,
};

pub use traits::{
    EmbeddingAdapter, PluginAdapter, ProviderAdapter, ProviderStream, RelationalStore,
};
