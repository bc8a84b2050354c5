// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `/etc/recall/recall.toml`, then `~/.config/recall/recall.toml`,
//! then `./recall.toml`, then `RECALL_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RecallConfig;

const SYSTEM_CONFIG: &str = "/etc/recall/recall.toml";
const LOCAL_CONFIG: &str = "recall.toml";

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<RecallConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of compiled defaults.
///
/// Environment variables are not consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<RecallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RecallConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file, skipping the XDG lookup.
pub fn load_config_from_path(path: &Path) -> Result<RecallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RecallConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RecallConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// `~/.config/recall/recall.toml` on this platform, if a config dir exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("recall").join("recall.toml"))
}

/// Sections a `RECALL_*` variable may address.
const SECTIONS: &[&str] = &["agent", "openai", "storage", "memory", "query"];

/// Maps `RECALL_<SECTION>_<KEY>` onto `<section>.<key>`.
fn env_provider() -> Env {
    Env::prefixed("RECALL_").map(|key| env_key(key.as_str()).into())
}

/// Rewrites a prefix-stripped variable name into a config path.
///
/// Figment hands over the name in its original case. Only the underscore
/// after the section is rewritten, so `MEMORY_MIN_RELEVANCE` becomes
/// `memory.min_relevance`. Names without a known section are left as-is.
pub(crate) fn env_key(raw: &str) -> String {
    let key = raw.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}

pub(crate) fn system_config_path() -> &'static Path {
    Path::new(SYSTEM_CONFIG)
}

pub(crate) fn local_config_path() -> &'static Path {
    Path::new(LOCAL_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_onto_sections_regardless_of_case() {
        assert_eq!(env_key("OPENAI_API_KEY"), "openai.api_key");
        assert_eq!(env_key("MEMORY_MIN_RELEVANCE"), "memory.min_relevance");
        assert_eq!(env_key("agent_max_tool_iterations"), "agent.max_tool_iterations");
        assert_eq!(env_key("QUERY_MAX_RESULT_BYTES"), "query.max_result_bytes");
    }

    #[test]
    fn only_the_section_underscore_is_rewritten() {
        assert_eq!(env_key("STORAGE_DATABASE_PATH"), "storage.database_path");
        assert_eq!(env_key("UNKNOWN_KEY"), "unknown_key");
    }

    #[test]
    fn api_key_from_env_loads() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RECALL_OPENAI_API_KEY", "sk-test");
            let config = load_config().map_err(|e| e.to_string())?;
            assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
            Ok(())
        });
    }
}
