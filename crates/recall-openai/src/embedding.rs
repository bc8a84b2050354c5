// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter for the OpenAI embeddings endpoint.

use async_trait::async_trait;
use recall_config::model::OpenAiConfig;
use recall_core::{
    EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, PluginAdapter, RecallError,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::EmbeddingRequest;

/// Remote embedder implementing [`EmbeddingAdapter`].
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder from the `[openai]` config section.
    pub fn new(config: &OpenAiConfig) -> Result<Self, RecallError> {
        let client = crate::build_client(config)?;
        info!(model = config.embedding_model, "OpenAI embedder initialized");
        Ok(Self::with_client(client, &config.embedding_model))
    }

    /// Creates an embedder over an existing client.
    pub fn with_client(client: OpenAiClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai-embeddings"
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        if input.texts.is_empty() {
            return Ok(EmbeddingOutput {
                embeddings: Vec::new(),
                dimensions: 0,
            });
        }

        let expected = input.texts.len();
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: input.texts,
        };
        let mut response = self.client.embed(&request).await?;

        if response.data.len() != expected {
            return Err(RecallError::RetrievalUnavailable {
                message: format!(
                    "embedding service returned {} vectors for {expected} inputs",
                    response.data.len()
                ),
                source: None,
            });
        }

        response.data.sort_by_key(|d| d.index);
        let embeddings: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        let dimensions = embeddings.first().map_or(0, Vec::len);
        debug!(count = embeddings.len(), dimensions, "embeddings received");

        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}
