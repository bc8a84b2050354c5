// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted relational store.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use recall_core::{NamedParams, PluginAdapter, RecallError, RelationalStore, Row};

use crate::lock;

/// Failure a scripted call should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    /// `DataSourceUnavailable`.
    Unavailable,
    /// `GeneratedQueryInvalid`.
    InvalidQuery,
}

/// Relational store that replays scripted results and records every call.
///
/// `execute` and `call_procedure` share one result queue; an empty queue
/// yields no rows.
#[derive(Default)]
pub struct MockRelationalStore {
    results: Mutex<VecDeque<Result<Vec<Row>, StoreFailure>>>,
    queries: Mutex<Vec<String>>,
    procedure_calls: Mutex<Vec<(String, NamedParams)>>,
}

impl MockRelationalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        lock(&self.results).push_back(Ok(rows));
    }

    pub fn push_failure(&self, failure: StoreFailure) {
        lock(&self.results).push_back(Err(failure));
    }

    /// Query texts passed to `execute`, in order.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }

    pub fn procedure_calls(&self) -> Vec<(String, NamedParams)> {
        lock(&self.procedure_calls).clone()
    }

    fn next_result(&self, query: &str) -> Result<Vec<Row>, RecallError> {
        match lock(&self.results).pop_front() {
            None => Ok(Vec::new()),
            Some(Ok(rows)) => Ok(rows),
            Some(Err(StoreFailure::Unavailable)) => Err(RecallError::DataSourceUnavailable {
                message: "mock store is unavailable".into(),
                source: None,
            }),
            Some(Err(StoreFailure::InvalidQuery)) => Err(RecallError::GeneratedQueryInvalid {
                query: query.to_string(),
                message: "near \"SELEC\": syntax error".into(),
            }),
        }
    }
}

#[async_trait]
impl PluginAdapter for MockRelationalStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl RelationalStore for MockRelationalStore {
    async fn execute(&self, query: &str) -> Result<Vec<Row>, RecallError> {
        lock(&self.queries).push(query.to_string());
        self.next_result(query)
    }

    async fn call_procedure(
        &self,
        name: &str,
        params: NamedParams,
    ) -> Result<Vec<Row>, RecallError> {
        lock(&self.procedure_calls).push((name.to_string(), params));
        self.next_result(name)
    }
}
