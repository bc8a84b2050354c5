// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for recall.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use recall_core::ResultShape;
use serde::{Deserialize, Serialize};

use crate::prompts::{QUERY_DATABASE_DESCRIPTION, SESSIONS_SCHEMA_PROMPT, SIMILAR_SESSIONS_DESCRIPTION};

/// Top-level recall configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecallConfig {
    /// Assistant identity and turn behaviour.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Completion and embedding endpoint settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Relational store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Semantic memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Query tool settings.
    #[serde(default)]
    pub query: QueryConfig,
}

/// Assistant identity and turn configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    /// Maximum tool call rounds per user turn.
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

fn default_agent_name() -> String {
    "recall".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_tool_iterations() -> usize {
    10
}

/// OpenAI or Azure OpenAI endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Base URL. For Azure, the resource URL (`https://<name>.openai.azure.com`).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Azure API version. When set, requests use Azure deployment routing.
    #[serde(default)]
    pub api_version: Option<String>,

    /// Chat model, or chat deployment name on Azure.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model, or embedding deployment name on Azure.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Maximum tokens to generate per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout for a single request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transient HTTP statuses (429, 500, 503).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            api_version: None,
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    1
}

/// Relational store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("recall").join("recall.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("recall.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Semantic memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable retrieval. When false, no context turns are ever injected.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Name of the table holding memory records.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Maximum records injected per user turn.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Minimum cosine similarity (inclusive) for a record to be injected.
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f32,

    /// Sentence placed before the retrieved texts in the context turn.
    #[serde(default = "default_lead_in")]
    pub lead_in: String,

    /// Knowledge ingested at startup.
    #[serde(default = "default_seed")]
    pub seed: Vec<SeedRecord>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            collection: default_collection(),
            limit: default_limit(),
            min_relevance: default_min_relevance(),
            lead_in: default_lead_in(),
            seed: default_seed(),
        }
    }
}

/// A memory record ingested at startup, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRecord {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

fn default_memory_enabled() -> bool {
    true
}

fn default_collection() -> String {
    "chat_memories".to_string()
}

fn default_limit() -> usize {
    3
}

fn default_min_relevance() -> f32 {
    0.35
}

fn default_lead_in() -> String {
    "Here's some additional information you can use to answer the question: ".to_string()
}

fn default_seed() -> Vec<SeedRecord> {
    vec![
        SeedRecord {
            id: "policy-price-increase".to_string(),
            text: "Premium for car insurance have been increased by 15% starting from September 2024"
                .to_string(),
            metadata: BTreeMap::new(),
        },
        SeedRecord {
            id: "safety-score-program".to_string(),
            text: "Customers can reduce their premium by subscribing to the \"Safety Score\" program \
                   which will monitor their driving habits and provide discounts based on their \
                   driving score."
                .to_string(),
            metadata: BTreeMap::new(),
        },
    ]
}

/// Query tool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Register query tools with the completion service.
    #[serde(default = "default_query_enabled")]
    pub enabled: bool,

    /// Tool output larger than this is truncated before reaching the model.
    #[serde(default = "default_max_result_bytes")]
    pub max_result_bytes: usize,

    /// One schema-described query tool per entry.
    #[serde(default = "default_query_tools")]
    pub tools: Vec<QueryToolConfig>,

    /// The precompiled similar-sessions procedure tool.
    #[serde(default)]
    pub similar: SimilarConfig,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            enabled: default_query_enabled(),
            max_result_bytes: default_max_result_bytes(),
            tools: default_query_tools(),
            similar: SimilarConfig::default(),
        }
    }
}

/// A schema-described query tool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueryToolConfig {
    /// Tool name shown to the model.
    pub name: String,

    /// What the tool answers, in plain language.
    pub description: String,

    /// Inline schema description. Exactly one of this or `schema_prompt_file`.
    #[serde(default)]
    pub schema_prompt: Option<String>,

    /// Path to a file holding the schema description.
    #[serde(default)]
    pub schema_prompt_file: Option<String>,

    #[serde(default)]
    pub result_shape: ResultShape,
}

fn default_query_enabled() -> bool {
    true
}

fn default_max_result_bytes() -> usize {
    50 * 1024
}

fn default_query_tools() -> Vec<QueryToolConfig> {
    vec![QueryToolConfig {
        name: "query_database".to_string(),
        description: QUERY_DATABASE_DESCRIPTION.to_string(),
        schema_prompt: Some(SESSIONS_SCHEMA_PROMPT.to_string()),
        schema_prompt_file: None,
        result_shape: ResultShape::DynamicRows,
    }]
}

/// The similar-sessions procedure tool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SimilarConfig {
    #[serde(default = "default_similar_enabled")]
    pub enabled: bool,

    /// Tool name shown to the model.
    #[serde(default = "default_similar_name")]
    pub name: String,

    /// Procedure name in the store's catalog.
    #[serde(default = "default_similar_procedure")]
    pub procedure: String,

    #[serde(default = "default_similar_description")]
    pub description: String,

    /// Maximum sessions returned per call.
    #[serde(default = "default_similar_limit")]
    pub limit: usize,
}

impl Default for SimilarConfig {
    fn default() -> Self {
        Self {
            enabled: default_similar_enabled(),
            name: default_similar_name(),
            procedure: default_similar_procedure(),
            description: default_similar_description(),
            limit: default_similar_limit(),
        }
    }
}

fn default_similar_enabled() -> bool {
    true
}

fn default_similar_name() -> String {
    "find_similar_sessions".to_string()
}

fn default_similar_procedure() -> String {
    "find_similar_sessions".to_string()
}

fn default_similar_description() -> String {
    SIMILAR_SESSIONS_DESCRIPTION.to_string()
}

fn default_similar_limit() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RecallConfig::default();
        assert_eq!(config.memory.limit, 3);
        assert!((config.memory.min_relevance - 0.35).abs() < f32::EPSILON);
        assert_eq!(config.memory.collection, "chat_memories");
        assert_eq!(config.memory.seed.len(), 2);
        assert_eq!(config.agent.max_tool_iterations, 10);
        assert_eq!(config.query.tools.len(), 1);
        assert_eq!(config.query.tools[0].name, "query_database");
        assert_eq!(config.query.similar.procedure, "find_similar_sessions");
    }

    #[test]
    fn seed_records_deserialize() {
        let toml_str = r#"
[[memory.seed]]
id = "p1"
text = "Premiums rose 15% in Sept 2024"
metadata = { source = "pricing" }
"#;
        let config: RecallConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.memory.seed.len(), 1);
        assert_eq!(config.memory.seed[0].id, "p1");
        assert_eq!(config.memory.seed[0].metadata["source"], "pricing");
    }

    #[test]
    fn result_shape_parses_snake_case() {
        let toml_str = r#"
[[query.tools]]
name = "customers"
description = "Customer data"
schema_prompt = "CREATE TABLE customers (id INTEGER)"
result_shape = "typed_records"
"#;
        let config: RecallConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.query.tools[0].result_shape, ResultShape::TypedRecords);
    }

    #[test]
    fn unknown_memory_key_is_rejected() {
        let toml_str = r#"
[memory]
min_relevence = 0.4
"#;
        assert!(toml::from_str::<RecallConfig>(toml_str).is_err());
    }
}
