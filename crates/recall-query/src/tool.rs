// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! The [`ToolRegistry`] maps a tool name to its handler. The completion
//! service only ever sees the declarative [`ToolDefinition`] list; dispatch
//! happens here through an explicit lookup.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use recall_core::{RecallError, ToolDefinition};
use serde::{Deserialize, Serialize};

/// Output from a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text handed back to the model, usually JSON.
    pub content: String,
    /// Whether the invocation failed.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// A callable operation the completion service may invoke on its own.
///
/// `invoke` receives the parsed JSON arguments of the model's tool call.
/// Recoverable failures are returned as `Err` so the caller can record them;
/// malformed arguments come back as an `is_error` output instead.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for lookup and in the tool definition.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema describing the tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, RecallError>;
}

/// Registry of available tools, indexed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its `name()`, replacing any previous entry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tool definitions for the provider request, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Looks up `name` and invokes it.
    pub async fn dispatch(
        &self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<ToolOutput, RecallError> {
        let tool = self.get(name).ok_or_else(|| RecallError::ToolNotFound {
            name: name.to_string(),
        })?;
        tool.invoke(input).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
