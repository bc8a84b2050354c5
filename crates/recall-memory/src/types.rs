// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory record types, vector encoding and relevance ranking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A unit of ingested knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Caller-supplied key; re-ingesting the same id overwrites the record.
    pub id: String,
    pub text: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub metadata: BTreeMap<String, String>,
    /// ISO 8601 timestamp of the first ingestion.
    pub created_at: String,
    /// ISO 8601 timestamp of the latest ingestion.
    pub updated_at: String,
}

/// A search hit with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    pub relevance: f32,
}

/// Convert f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert SQLite BLOB back to f32 vector. Trailing partial chunks are dropped.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity in `[-1, 1]`.
///
/// Returns `None` when the dimensions differ. A zero vector scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }
    Some((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Scores `records` (given in insertion order) against `query` and keeps at
/// most `limit` hits with relevance `>= min_relevance`, best first.
///
/// Records whose embedding dimension differs from the query are skipped.
/// Equal scores keep insertion order.
pub fn rank(
    query: &[f32],
    records: Vec<MemoryRecord>,
    limit: usize,
    min_relevance: f32,
) -> Vec<ScoredMemory> {
    let mut hits: Vec<ScoredMemory> = records
        .into_iter()
        .filter_map(|record| {
            let relevance = cosine_similarity(query, &record.embedding)?;
            (relevance >= min_relevance).then_some(ScoredMemory { record, relevance })
        })
        .collect();

    // sort_by is stable, so ties stay in insertion order.
    hits.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    hits.truncate(limit);
    hits
}
