// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for recall integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Completion service replaying scripted replies
//! - [`MockEmbedder`] - Bag-of-words embedding service
//! - [`MockRelationalStore`] - Relational store replaying scripted rows
//! - [`TestHarness`] - A full orchestrator wired to the mocks

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod harness;
pub mod mock_embedder;
pub mod mock_provider;
pub mod mock_store;

pub use harness::{TestHarness, TestHarnessBuilder, in_memory_index};
pub use mock_embedder::MockEmbedder;
pub use mock_provider::{MockProvider, MockReply};
pub use mock_store::{MockRelationalStore, StoreFailure};

/// Builds a row from `(column, value)` pairs.
pub fn row(pairs: &[(&str, serde_json::Value)]) -> recall_core::Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
