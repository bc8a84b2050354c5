// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic recall over ingested text.

use std::collections::BTreeMap;
use std::sync::Arc;

use recall_config::model::SeedRecord;
use recall_core::{EmbeddingAdapter, EmbeddingInput, RecallError};
use tracing::{debug, info};

use crate::store::MemoryStore;
use crate::types::{ScoredMemory, rank};

/// Embeds text through an [`EmbeddingAdapter`] and ranks stored records by
/// cosine similarity.
pub struct MemoryIndex {
    store: Arc<MemoryStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
}

impl MemoryIndex {
    pub fn new(store: Arc<MemoryStore>, embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        Self { store, embedder }
    }

    /// The collection backing this index.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Embeds `text` and upserts it under `source_id`.
    pub async fn ingest(
        &self,
        text: &str,
        source_id: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), RecallError> {
        let embedding = self.embed_one(text).await?;
        self.store
            .upsert(source_id, text, &embedding, &metadata)
            .await?;
        debug!(id = source_id, dims = embedding.len(), "memory ingested");
        Ok(())
    }

    /// Ingests seed records with a single batched embedding call.
    pub async fn ingest_seeds(&self, seeds: &[SeedRecord]) -> Result<usize, RecallError> {
        if seeds.is_empty() {
            return Ok(0);
        }
        let texts = seeds.iter().map(|s| s.text.clone()).collect();
        let output = self
            .embedder
            .embed(EmbeddingInput { texts })
            .await
            .map_err(retrieval_err)?;
        if output.embeddings.len() != seeds.len() {
            return Err(RecallError::RetrievalUnavailable {
                message: format!(
                    "embedding service returned {} vectors for {} texts",
                    output.embeddings.len(),
                    seeds.len()
                ),
                source: None,
            });
        }

        for (seed, embedding) in seeds.iter().zip(&output.embeddings) {
            self.store
                .upsert(&seed.id, &seed.text, embedding, &seed.metadata)
                .await?;
        }
        info!(
            count = seeds.len(),
            collection = self.store.collection(),
            "seed knowledge ingested"
        );
        Ok(seeds.len())
    }

    /// Returns up to `limit` records with relevance `>= min_relevance`, best
    /// first. An empty result means nothing was relevant enough.
    ///
    /// Any failure of the embedding service or the collection surfaces as
    /// [`RecallError::RetrievalUnavailable`].
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        min_relevance: f32,
    ) -> Result<Vec<ScoredMemory>, RecallError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embed_one(query).await?;
        let records = self.store.all().await.map_err(retrieval_err)?;
        let candidates = records.len();
        let hits = rank(&query_embedding, records, limit, min_relevance);
        debug!(candidates, hits = hits.len(), min_relevance, "memory search");
        Ok(hits)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RecallError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await
            .map_err(retrieval_err)?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RecallError::RetrievalUnavailable {
                message: "embedding service returned no vectors".into(),
                source: None,
            })
    }
}

fn retrieval_err(e: RecallError) -> RecallError {
    match e {
        RecallError::RetrievalUnavailable { .. } => e,
        other => RecallError::RetrievalUnavailable {
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_test_utils::MockEmbedder;
    use tokio_rusqlite::Connection;

    async fn index(embedder: Arc<MockEmbedder>) -> MemoryIndex {
        let conn = Connection::open_in_memory().await.unwrap();
        let store = MemoryStore::open(conn, "chat_memories").await.unwrap();
        MemoryIndex::new(Arc::new(store), embedder)
    }

    fn insurance_embedder() -> Arc<MockEmbedder> {
        Arc::new(MockEmbedder::new(&["premium", "safety", "driving", "weather"]))
    }

    #[tokio::test]
    async fn reingest_overwrites_by_id() {
        let index = index(insurance_embedder()).await;
        index.ingest("first text", "x", BTreeMap::new()).await.unwrap();
        index.ingest("second text", "x", BTreeMap::new()).await.unwrap();

        assert_eq!(index.store().count().await.unwrap(), 1);
        let record = index.store().get("x").await.unwrap().unwrap();
        assert_eq!(record.text, "second text");
    }

    #[tokio::test]
    async fn relevant_record_clears_threshold() {
        let index = index(insurance_embedder()).await;
        index
            .ingest("Premiums rose 15% in Sept 2024", "p1", BTreeMap::new())
            .await
            .unwrap();
        index
            .ingest("Safety Score monitors driving", "s1", BTreeMap::new())
            .await
            .unwrap();

        let hits = index
            .search("Did premiums change recently?", 3, 0.35)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id, "p1");
        assert!(hits[0].relevance >= 0.35);
    }

    #[tokio::test]
    async fn nothing_relevant_is_empty_not_error() {
        let index = index(insurance_embedder()).await;
        index
            .ingest("Premiums rose 15%", "p1", BTreeMap::new())
            .await
            .unwrap();
        let hits = index.search("What's the weather?", 3, 0.35).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn limit_caps_results() {
        let index = index(insurance_embedder()).await;
        for i in 0..5 {
            index
                .ingest(&format!("premium fact {i}"), &format!("p{i}"), BTreeMap::new())
                .await
                .unwrap();
        }
        let hits = index.search("premium", 3, 0.0).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.record.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
        assert!(index.search("premium", 0, 0.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn embedder_outage_is_retrieval_unavailable() {
        let embedder = insurance_embedder();
        let index = index(embedder.clone()).await;
        embedder.set_failing(true);
        let err = index.search("premium", 3, 0.35).await.unwrap_err();
        assert!(matches!(err, RecallError::RetrievalUnavailable { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn seeds_are_batched_and_idempotent() {
        let embedder = insurance_embedder();
        let index = index(embedder.clone()).await;
        let seeds = recall_config::RecallConfig::default().memory.seed;

        assert_eq!(index.ingest_seeds(&seeds).await.unwrap(), 2);
        assert_eq!(embedder.calls(), 1);
        index.ingest_seeds(&seeds).await.unwrap();
        assert_eq!(index.store().count().await.unwrap(), 2);
    }
}
