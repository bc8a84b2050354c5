// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic bag-of-words embedder.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use recall_core::{
    EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, PluginAdapter, RecallError,
};

/// Embeds text as word counts over a fixed vocabulary.
///
/// Component `i` counts the words starting with `vocabulary[i]`, ignoring
/// case, so "premiums" counts toward "premium". Texts sharing no vocabulary
/// word score 0 against each other.
pub struct MockEmbedder {
    vocabulary: Vec<String>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|w| w.to_lowercase()).collect(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Makes every following `embed` call fail with `RetrievalUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` calls, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            for (i, term) in self.vocabulary.iter().enumerate() {
                if word.starts_with(term.as_str()) {
                    vector[i] += 1.0;
                }
            }
        }
        vector
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RecallError::RetrievalUnavailable {
                message: "mock embedder is failing".into(),
                source: None,
            });
        }
        let embeddings: Vec<Vec<f32>> = input.texts.iter().map(|t| self.embed_text(t)).collect();
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.vocabulary.len(),
        })
    }
}
