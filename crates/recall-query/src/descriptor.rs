// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static description of one schema-described query capability.

use recall_config::model::QueryToolConfig;
use recall_core::{RecallError, ResultShape};
use tracing::info;

/// One registered query capability. Immutable after start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToolDescriptor {
    pub name: String,
    /// Plain-language description shown to the model.
    pub description: String,
    /// DDL-like schema description plus extraction-function guidance.
    pub schema_prompt: String,
    pub result_shape: ResultShape,
}

impl QueryToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema_prompt: schema_prompt.into(),
            result_shape: ResultShape::default(),
        }
    }

    pub fn with_result_shape(mut self, shape: ResultShape) -> Self {
        self.result_shape = shape;
        self
    }

    /// Builds a descriptor from config, reading `schema_prompt_file` if set.
    pub async fn load(config: &QueryToolConfig) -> Result<Self, RecallError> {
        let schema_prompt = match (&config.schema_prompt, &config.schema_prompt_file) {
            (_, Some(path)) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    RecallError::Config(format!(
                        "failed to read schema prompt for tool `{}` from {path}: {e}",
                        config.name
                    ))
                })?;
                info!(tool = config.name, path = path.as_str(), "loaded schema prompt from file");
                text
            }
            (Some(inline), None) => inline.clone(),
            (None, None) => {
                return Err(RecallError::Config(format!(
                    "tool `{}` has no schema prompt",
                    config.name
                )));
            }
        };

        let schema_prompt = schema_prompt.trim().to_string();
        if schema_prompt.is_empty() {
            return Err(RecallError::Config(format!(
                "tool `{}` has an empty schema prompt",
                config.name
            )));
        }

        Ok(Self {
            name: config.name.clone(),
            description: config.description.clone(),
            schema_prompt,
            result_shape: config.result_shape,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config(inline: Option<&str>, file: Option<String>) -> QueryToolConfig {
        QueryToolConfig {
            name: "query_policies".into(),
            description: "Policies".into(),
            schema_prompt: inline.map(str::to_string),
            schema_prompt_file: file,
            result_shape: ResultShape::TypedRecords,
        }
    }

    #[tokio::test]
    async fn inline_prompt_is_trimmed() {
        let d = QueryToolDescriptor::load(&config(Some("  CREATE TABLE p (id INT);\n"), None))
            .await
            .unwrap();
        assert_eq!(d.schema_prompt, "CREATE TABLE p (id INT);");
        assert_eq!(d.result_shape, ResultShape::TypedRecords);
    }

    #[tokio::test]
    async fn prompt_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CREATE TABLE customers (id INT, name TEXT);").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let d = QueryToolDescriptor::load(&config(None, Some(path)))
            .await
            .unwrap();
        assert!(d.schema_prompt.starts_with("CREATE TABLE customers"));
    }

    #[tokio::test]
    async fn missing_file_is_config_error() {
        let err = QueryToolDescriptor::load(&config(None, Some("/nonexistent/schema.txt".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Config(_)));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        let err = QueryToolDescriptor::load(&config(Some("   "), None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty schema prompt"));
    }
}
