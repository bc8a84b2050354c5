// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy shared by every recall crate.

use thiserror::Error;

/// Boxed error source carried by the adapter-facing variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all recall adapters and core operations.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Configuration errors (invalid TOML, missing API key, bad identifiers).
    #[error("configuration error: {0}")]
    Config(String),

    /// Local persistence errors (memory collection, migrations).
    #[error("storage error: {source}")]
    Storage { source: BoxError },

    /// The memory index or its embedding provider is unreachable.
    ///
    /// Recoverable: the orchestrator answers without retrieved context.
    #[error("retrieval unavailable: {message}")]
    RetrievalUnavailable {
        message: String,
        source: Option<BoxError>,
    },

    /// The relational store is unreachable.
    ///
    /// Recoverable at the tool-call level.
    #[error("data source unavailable: {message}")]
    DataSourceUnavailable {
        message: String,
        source: Option<BoxError>,
    },

    /// The model produced query text the store rejected. Never retried.
    #[error("generated query is invalid: {message}")]
    GeneratedQueryInvalid { query: String, message: String },

    /// The completion endpoint failed. Fatal to the current turn only.
    #[error("completion unavailable: {message}")]
    CompletionUnavailable {
        message: String,
        source: Option<BoxError>,
    },

    /// The completion service ended without producing any content object.
    #[error("completion produced no content")]
    NoContent,

    /// A transcript mutation was attempted with malformed input.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The model asked for a tool that is not registered.
    #[error("unknown tool: {name}")]
    ToolNotFound { name: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RecallError {
    /// Returns true when the failure should be folded back into the
    /// conversation instead of ending the turn.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RecallError::RetrievalUnavailable { .. }
                | RecallError::DataSourceUnavailable { .. }
                | RecallError::GeneratedQueryInvalid { .. }
                | RecallError::NoContent
                | RecallError::ToolNotFound { .. }
        )
    }

    /// Shorthand for a [`RecallError::CompletionUnavailable`] without a source.
    pub fn completion(message: impl Into<String>) -> Self {
        RecallError::CompletionUnavailable {
            message: message.into(),
            source: None,
        }
    }
}
