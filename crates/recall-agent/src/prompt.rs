// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt resolution and rendering.

use chrono::NaiveDate;
use recall_config::model::AgentConfig;
use recall_config::prompts::DEFAULT_SYSTEM_PROMPT;
use tracing::{info, warn};

/// Placeholder replaced with the session's start date.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Loads the prompt template: file, then inline string, then the default.
pub async fn load_system_prompt(agent: &AgentConfig) -> String {
    if let Some(path) = &agent.system_prompt_file {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    info!(path = path.as_str(), "loaded system prompt from file");
                    return trimmed.to_string();
                }
                warn!(path = path.as_str(), "system prompt file is empty, falling back");
            }
            Err(e) => {
                warn!(
                    path = path.as_str(),
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    if let Some(prompt) = &agent.system_prompt {
        if !prompt.trim().is_empty() {
            return prompt.clone();
        }
    }

    DEFAULT_SYSTEM_PROMPT.to_string()
}

/// Replaces every `{date}` in `template` with `date` as `YYYY-MM-DD`.
pub fn render_system_prompt(template: &str, date: NaiveDate) -> String {
    template.replace(DATE_PLACEHOLDER, &date.format("%Y-%m-%d").to_string())
}

/// Renders `template` with today's local date.
pub fn render_for_today(template: &str) -> String {
    render_system_prompt(template, chrono::Local::now().date_naive())
}
