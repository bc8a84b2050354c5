// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall - a retrieval-augmented chat agent.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod chat;
mod deploy;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use recall_config::RecallConfig;

/// Recall - a retrieval-augmented chat agent.
#[derive(Parser, Debug)]
#[command(name = "recall", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat session.
    Chat {
        /// Log at debug level regardless of configuration.
        #[arg(long)]
        debug: bool,
    },
    /// Create or upgrade the sample database schema.
    Deploy,
}

fn load_config(path: Option<&PathBuf>) -> Result<RecallConfig, Vec<recall_config::ConfigError>> {
    match path {
        Some(path) => recall_config::load_and_validate_path(path),
        None => recall_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            recall_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Chat { debug }) => {
            let level = if debug { "debug" } else { config.agent.log_level.as_str() };
            init_tracing(level);
            chat::run_chat(config).await
        }
        Some(Commands::Deploy) => {
            init_tracing(&config.agent.log_level);
            deploy::run_deploy(&config).await
        }
        None => {
            println!("recall: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber on stderr with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let crates = [
            "recall",
            "recall_core",
            "recall_config",
            "recall_storage",
            "recall_memory",
            "recall_openai",
            "recall_query",
            "recall_agent",
        ];
        let directives: Vec<String> = crates
            .iter()
            .map(|name| format!("{name}={log_level}"))
            .collect();
        EnvFilter::new(format!("{},warn", directives.join(",")))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_chat_and_deploy() {
        let cli = Cli::try_parse_from(["recall", "chat", "--debug"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Chat { debug: true })));

        let cli = Cli::try_parse_from(["recall", "deploy", "--config", "x.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Deploy)));
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = RecallConfig::default();
        assert_eq!(config.agent.name, "recall");
        assert_eq!(config.memory.collection, "chat_memories");
    }
}
