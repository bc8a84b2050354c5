// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic similar-sessions lookup through a named store procedure.

use std::sync::Arc;

use async_trait::async_trait;
use recall_core::{NamedParams, RecallError, RelationalStore, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::render::truncate_output;
use crate::tool::{Tool, ToolOutput};

/// A session row returned by the similar-sessions procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceSession {
    pub id: i64,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub external_id: Option<String>,
    #[serde(default)]
    pub speakers: Vec<String>,
    /// Lower is closer.
    pub distance: f64,
}

impl ConferenceSession {
    fn from_row(row: &Row) -> Result<Self, RecallError> {
        let malformed = |field: &str| RecallError::DataSourceUnavailable {
            message: format!("similar-sessions row has no valid `{field}` column"),
            source: None,
        };

        let id = row.get("id").and_then(Value::as_i64).ok_or_else(|| malformed("id"))?;
        let title = row
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("title"))?
            .to_string();
        let text = |field: &str| row.get(field).and_then(Value::as_str).map(str::to_string);
        let distance = row
            .get("distance")
            .and_then(Value::as_f64)
            .ok_or_else(|| malformed("distance"))?;

        Ok(Self {
            id,
            title,
            abstract_: text("abstract"),
            external_id: text("external_id"),
            speakers: parse_speakers(row.get("speakers")),
            distance,
        })
    }
}

/// Speakers arrive as a JSON array or as its text encoding.
fn parse_speakers(value: Option<&Value>) -> Vec<String> {
    let array = match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(text)) => serde_json::from_str::<Vec<Value>>(text).unwrap_or_default(),
        _ => Vec::new(),
    };
    array
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Builds a full-text match expression from free text.
///
/// Each alphanumeric token is quoted and the tokens are OR-ed, so user text
/// never reaches the match grammar unescaped. `None` when no token remains.
pub fn match_expression(topic: &str) -> Option<String> {
    let tokens: Vec<String> = topic
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

/// Calls the precompiled similar-sessions procedure. No completion service
/// involvement; parameters are bound, never spliced.
pub struct SimilarSessionsTool {
    name: String,
    description: String,
    procedure: String,
    limit: usize,
    store: Arc<dyn RelationalStore>,
    max_result_bytes: usize,
}

impl SimilarSessionsTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        procedure: impl Into<String>,
        limit: usize,
        store: Arc<dyn RelationalStore>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            procedure: procedure.into(),
            limit,
            store,
            max_result_bytes: usize::MAX,
        }
    }

    pub fn with_max_result_bytes(mut self, max_result_bytes: usize) -> Self {
        self.max_result_bytes = max_result_bytes;
        self
    }

    /// Returns sessions similar to `topic`, closest first.
    pub async fn find_similar(&self, topic: &str) -> Result<Vec<ConferenceSession>, RecallError> {
        info!(topic, "searching for sessions related to topic");

        let Some(expression) = match_expression(topic) else {
            return Ok(Vec::new());
        };

        let mut params = NamedParams::new();
        params.insert("topic".into(), Value::String(expression));
        params.insert("limit".into(), Value::from(self.limit as u64));

        let rows = self.store.call_procedure(&self.procedure, params).await?;
        rows.iter().map(ConferenceSession::from_row).collect()
    }
}

#[async_trait]
impl Tool for SimilarSessionsTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "description": "The topic to find sessions about"
                }
            },
            "required": ["topic"]
        })
    }

    async fn invoke(&self, input: Value) -> Result<ToolOutput, RecallError> {
        let Some(topic) = input["topic"].as_str() else {
            return Ok(ToolOutput::error("missing required parameter: topic"));
        };
        let sessions = self.find_similar(topic).await?;
        let rendered = serde_json::to_string(&sessions)
            .map_err(|e| RecallError::Internal(format!("failed to serialize sessions: {e}")))?;
        Ok(ToolOutput::ok(truncate_output(rendered, self.max_result_bytes)))
    }
}
