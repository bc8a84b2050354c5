// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query tools for recall.
//!
//! [`SchemaQueryTool`] turns a natural-language data request into a query
//! using a fixed schema description; [`SimilarSessionsTool`] calls a named
//! store procedure with bound parameters. Both register in a
//! [`ToolRegistry`] the orchestrator dispatches through.

pub mod descriptor;
pub mod render;
pub mod schema_query;
pub mod similar;
pub mod sql;
pub mod tool;

use std::sync::Arc;

use recall_config::model::QueryConfig;
use recall_core::{ProviderAdapter, RecallError, RelationalStore};
use tracing::info;

pub use descriptor::QueryToolDescriptor;
pub use schema_query::{QUERY_FORMAT_DIRECTIVE, SchemaQueryTool};
pub use similar::{ConferenceSession, SimilarSessionsTool};
pub use sql::strip_code_fences;
pub use tool::{Tool, ToolOutput, ToolRegistry};

/// Builds the registry described by the `[query]` config section.
///
/// Returns an empty registry when query tools are disabled.
pub async fn build_registry(
    config: &QueryConfig,
    provider: Arc<dyn ProviderAdapter>,
    store: Arc<dyn RelationalStore>,
    model: &str,
    max_tokens: u32,
) -> Result<ToolRegistry, RecallError> {
    let mut registry = ToolRegistry::new();
    if !config.enabled {
        return Ok(registry);
    }

    for tool_config in &config.tools {
        let descriptor = Arc::new(QueryToolDescriptor::load(tool_config).await?);
        let tool = SchemaQueryTool::new(
            descriptor,
            provider.clone(),
            store.clone(),
            model,
            max_tokens,
        )
        .with_max_result_bytes(config.max_result_bytes);
        registry.register(Arc::new(tool));
    }

    if config.similar.enabled {
        let similar = &config.similar;
        let tool = SimilarSessionsTool::new(
            &similar.name,
            &similar.description,
            &similar.procedure,
            similar.limit,
            store,
        )
        .with_max_result_bytes(config.max_result_bytes);
        registry.register(Arc::new(tool));
    }

    info!(tools = registry.len(), "query tools registered");
    Ok(registry)
}
