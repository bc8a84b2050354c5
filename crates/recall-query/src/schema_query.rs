// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Natural-language-to-query tool over one described schema.
//!
//! The generated query text is executed verbatim after fence stripping. No
//! allow-list or parameterisation is applied: running arbitrary model-written
//! queries against the store is an accepted risk of this tool. Point it at a
//! read-only database if that risk is not acceptable.

use std::sync::Arc;

use async_trait::async_trait;
use recall_core::{
    ProviderAdapter, ProviderMessage, ProviderRequest, RecallError, RelationalStore, Row,
};
use tracing::{info, warn};

use crate::descriptor::QueryToolDescriptor;
use crate::render::{render_rows, truncate_output};
use crate::sql::strip_code_fences;
use crate::tool::{Tool, ToolOutput};

/// Output-format directive appended to every schema prompt.
pub const QUERY_FORMAT_DIRECTIVE: &str = "Just return the query text and no other text or \
explanation. Don't use markdown or any wrappers.";

/// Translates a data request into a query with the completion service and
/// runs it against the relational store.
pub struct SchemaQueryTool {
    descriptor: Arc<QueryToolDescriptor>,
    provider: Arc<dyn ProviderAdapter>,
    store: Arc<dyn RelationalStore>,
    model: String,
    max_tokens: u32,
    max_result_bytes: usize,
}

impl SchemaQueryTool {
    pub fn new(
        descriptor: Arc<QueryToolDescriptor>,
        provider: Arc<dyn ProviderAdapter>,
        store: Arc<dyn RelationalStore>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            descriptor,
            provider,
            store,
            model: model.into(),
            max_tokens,
            max_result_bytes: usize::MAX,
        }
    }

    pub fn with_max_result_bytes(mut self, max_result_bytes: usize) -> Self {
        self.max_result_bytes = max_result_bytes;
        self
    }

    pub fn descriptor(&self) -> &QueryToolDescriptor {
        &self.descriptor
    }

    /// Builds the isolated two-turn instruction transcript for `request`.
    fn instruction_request(&self, request: &str) -> ProviderRequest {
        let system = format!("{}\n\n{QUERY_FORMAT_DIRECTIVE}", self.descriptor.schema_prompt);
        ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                ProviderMessage::text("system", system),
                ProviderMessage::text("user", request),
            ],
            max_tokens: self.max_tokens,
            stream: false,
            tools: None,
        }
    }

    /// Asks the completion service for query text. `None` when it produced
    /// nothing usable.
    pub async fn generate_query(&self, request: &str) -> Result<Option<String>, RecallError> {
        let response = self
            .provider
            .complete(self.instruction_request(request))
            .await?;
        Ok(response
            .content
            .map(|text| strip_code_fences(&text))
            .filter(|query| !query.is_empty()))
    }

    /// Generates a query for `request`, executes it, and returns the raw rows.
    ///
    /// No generated query yields an empty row set and a warning. Store
    /// failures propagate unchanged and are never retried.
    pub async fn answer(&self, request: &str) -> Result<Vec<Row>, RecallError> {
        info!(tool = self.descriptor.name, request, "querying the database");

        let Some(query) = self.generate_query(request).await? else {
            warn!(
                tool = self.descriptor.name,
                "completion service was not able to generate a query"
            );
            return Ok(Vec::new());
        };

        info!(tool = self.descriptor.name, query = query.as_str(), "executing generated query");
        let rows = self.store.execute(&query).await?;
        info!(tool = self.descriptor.name, rows = rows.len(), "query returned");
        Ok(rows)
    }
}

#[async_trait]
impl Tool for SchemaQueryTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": "The data request in plain language"
                }
            },
            "required": ["request"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, RecallError> {
        let Some(request) = input["request"].as_str().filter(|r| !r.trim().is_empty()) else {
            return Ok(ToolOutput::error("missing required parameter: request"));
        };
        let rows = self.answer(request).await?;
        let rendered = render_rows(&rows, self.descriptor.result_shape);
        Ok(ToolOutput::ok(truncate_output(rendered, self.max_result_bytes)))
    }
}
