// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic memory for recall.
//!
//! - **MemoryStore**: one named SQLite collection with BLOB embeddings
//! - **MemoryIndex**: ingest and cosine-ranked search through an embedding adapter
//! - **RetrievalContext**: hits folded into a single context turn

pub mod context;
pub mod index;
pub mod store;
pub mod types;

pub use context::RetrievalContext;
pub use index::MemoryIndex;
pub use store::MemoryStore;
pub use types::*;
