// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion service contract.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::RecallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse, ProviderStreamChunk};

/// Ordered stream of chunks for one completion.
pub type ProviderStream =
    Pin<Box<dyn Stream<Item = Result<ProviderStreamChunk, RecallError>> + Send>>;

/// Adapter for LLM completion services.
///
/// Given an ordered transcript and an optional tool list, returns either a
/// single content object or an ordered stream of content deltas.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, RecallError>;

    /// Sends a completion request and returns a stream of response chunks.
    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, RecallError>;
}
