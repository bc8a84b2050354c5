// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::RecallConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &RecallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "agent.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.agent.log_level
        )));
    }

    if config.agent.max_tool_iterations == 0 {
        errors.push(ConfigError::validation(
            "agent.max_tool_iterations must be at least 1",
        ));
    }

    if config.agent.system_prompt.is_some() && config.agent.system_prompt_file.is_some() {
        errors.push(ConfigError::validation(
            "agent.system_prompt and agent.system_prompt_file are mutually exclusive",
        ));
    }

    if config.openai.endpoint.trim().is_empty() {
        errors.push(ConfigError::validation("openai.endpoint must not be empty"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    validate_memory(config, &mut errors);
    validate_query(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_memory(config: &RecallConfig, errors: &mut Vec<ConfigError>) {
    let memory = &config.memory;

    if !is_sql_identifier(&memory.collection) {
        errors.push(ConfigError::validation(format!(
            "memory.collection `{}` must be an identifier (letters, digits, underscore; not starting with a digit)",
            memory.collection
        )));
    }

    if memory.limit == 0 {
        errors.push(ConfigError::validation("memory.limit must be at least 1"));
    }

    if !(-1.0..=1.0).contains(&memory.min_relevance) {
        errors.push(ConfigError::validation(format!(
            "memory.min_relevance must be between -1.0 and 1.0, got {}",
            memory.min_relevance
        )));
    }

    if memory.lead_in.trim().is_empty() {
        errors.push(ConfigError::validation("memory.lead_in must not be blank"));
    }

    let mut seen = HashSet::new();
    for record in &memory.seed {
        if record.id.trim().is_empty() {
            errors.push(ConfigError::validation("memory.seed ids must not be empty"));
        } else if !seen.insert(record.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "memory.seed id `{}` is duplicated",
                record.id
            )));
        }
    }
}

fn validate_query(config: &RecallConfig, errors: &mut Vec<ConfigError>) {
    let query = &config.query;

    if query.max_result_bytes == 0 {
        errors.push(ConfigError::validation(
            "query.max_result_bytes must be at least 1",
        ));
    }

    let mut names = HashSet::new();
    for tool in &query.tools {
        if !is_tool_name(&tool.name) {
            errors.push(ConfigError::validation(format!(
                "query.tools name `{}` may only contain letters, digits, `_` and `-`",
                tool.name
            )));
        }
        if !names.insert(tool.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "query.tools name `{}` is duplicated",
                tool.name
            )));
        }
        match (&tool.schema_prompt, &tool.schema_prompt_file) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => errors.push(ConfigError::validation(format!(
                "query.tools `{}` needs exactly one of schema_prompt or schema_prompt_file",
                tool.name
            ))),
        }
    }

    let similar = &query.similar;
    if similar.enabled {
        if !is_tool_name(&similar.name) {
            errors.push(ConfigError::validation(format!(
                "query.similar.name `{}` may only contain letters, digits, `_` and `-`",
                similar.name
            )));
        } else if names.contains(similar.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "query.similar.name `{}` collides with a query tool",
                similar.name
            )));
        }
        if similar.limit == 0 {
            errors.push(ConfigError::validation(
                "query.similar.limit must be at least 1",
            ));
        }
    }
}

/// True for names usable as an unquoted SQLite table name.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn is_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
