// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relational store contract used by the query tools.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{NamedParams, Row};

/// A relational store that can run free-form queries and named procedures.
///
/// Connectivity failures surface as [`RecallError::DataSourceUnavailable`];
/// statements the store rejects surface as
/// [`RecallError::GeneratedQueryInvalid`].
#[async_trait]
pub trait RelationalStore: PluginAdapter {
    /// Executes `query` verbatim and returns its rows with a dynamic column set.
    async fn execute(&self, query: &str) -> Result<Vec<Row>, RecallError>;

    /// Calls a precompiled procedure by name with bound named parameters.
    async fn call_procedure(&self, name: &str, params: NamedParams)
    -> Result<Vec<Row>, RecallError>;
}
