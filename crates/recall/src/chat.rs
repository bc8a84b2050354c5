// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall chat` command implementation.
//!
//! Launches an interactive REPL with a colored prompt, streamed answers and
//! readline history. One conversation per invocation.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use recall_agent::{
    AgentDeps, RetrievalOrchestrator, TurnOutcome, TurnSettings, load_system_prompt,
    render_for_today,
};
use recall_config::RecallConfig;
use recall_core::{
    EmbeddingAdapter, PluginAdapter, ProviderAdapter, RecallError, RelationalStore, Role, Turn,
};
use recall_memory::{MemoryIndex, MemoryStore};
use recall_openai::{API_KEY_ENV_VAR, OpenAiEmbedder, OpenAiProvider};
use recall_storage::SqliteStore;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs the `recall chat` interactive REPL.
pub async fn run_chat(config: RecallConfig) -> Result<(), RecallError> {
    let provider: Arc<dyn ProviderAdapter> =
        Arc::new(OpenAiProvider::new(&config.openai).inspect_err(|_| {
            eprintln!(
                "error: OpenAI API key required. Set openai.api_key, RECALL_OPENAI_API_KEY or {API_KEY_ENV_VAR}"
            );
        })?);
    let embedder: Arc<dyn EmbeddingAdapter> = Arc::new(OpenAiEmbedder::new(&config.openai)?);

    let (deps, store) = assemble(&config, provider.clone(), embedder).await?;
    let template = load_system_prompt(&config.agent).await;
    let mut orchestrator = RetrievalOrchestrator::new(deps, render_for_today(&template));

    let mut rl = DefaultEditor::new()
        .map_err(|e| RecallError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", config.agent.name.bold().green());
    println!(
        "Type {} to clear the screen, {} to clear history, {} to show history, {} to exit.\n",
        "/c".yellow(),
        "/ch".yellow(),
        "/h".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", "you".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                match trimmed {
                    "" => continue,
                    "/quit" | "/exit" => break,
                    "/c" => {
                        print!("\x1B[2J\x1B[1;1H");
                        let _ = std::io::stdout().flush();
                        continue;
                    }
                    "/ch" => {
                        orchestrator.clear_history();
                        println!("{}", "history cleared".dimmed());
                        continue;
                    }
                    "/h" => {
                        print_history(orchestrator.history());
                        continue;
                    }
                    _ => {}
                }

                let _ = rl.add_history_entry(&line);
                handle_line(&mut orchestrator, trimmed).await;
            }
            // Ctrl+C or Ctrl+D at the prompt.
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    shutdown(provider.as_ref(), store.as_ref()).await;
    Ok(())
}

/// Wires the storage, memory and query tools around the given services.
///
/// Returns the store alongside the deps so the caller can shut it down.
/// Seed records are ingested here. A failed ingestion is logged and the chat
/// continues with whatever the collection already holds.
pub(crate) async fn assemble(
    config: &RecallConfig,
    provider: Arc<dyn ProviderAdapter>,
    embedder: Arc<dyn EmbeddingAdapter>,
) -> Result<(AgentDeps, Arc<SqliteStore>), RecallError> {
    let store = Arc::new(SqliteStore::open(&config.storage).await?);

    let memory = if config.memory.enabled {
        let conn = store.database().connection().clone();
        let collection = Arc::new(MemoryStore::open(conn, &config.memory.collection).await?);
        let index = Arc::new(MemoryIndex::new(collection, embedder));
        match index.ingest_seeds(&config.memory.seed).await {
            Ok(count) => info!(count, "seed memories ingested"),
            Err(e) => warn!(error = %e, "seed ingestion failed, continuing"),
        }
        Some(index)
    } else {
        info!("memory disabled by configuration");
        None
    };

    let relational: Arc<dyn RelationalStore> = store.clone();
    let tools = recall_query::build_registry(
        &config.query,
        provider.clone(),
        relational,
        &config.openai.chat_model,
        config.openai.max_tokens,
    )
    .await?;

    let deps = AgentDeps {
        provider,
        memory,
        tools: Arc::new(tools),
        settings: TurnSettings::from_config(config),
    };
    Ok((deps, store))
}

/// Releases the services once the REPL exits. Failures are only logged.
pub(crate) async fn shutdown(provider: &dyn ProviderAdapter, store: &SqliteStore) {
    if let Err(e) = provider.shutdown().await {
        warn!(adapter = provider.name(), error = %e, "adapter shutdown failed");
    }
    if let Err(e) = store.shutdown().await {
        warn!(adapter = store.name(), error = %e, "adapter shutdown failed");
    }
    info!("chat session closed");
}

/// Runs one user turn, streaming tokens to stdout.
///
/// Ctrl+C while the turn runs cancels it without committing anything.
async fn handle_line(orchestrator: &mut RetrievalOrchestrator, input: &str) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let mut started = false;
    let result = {
        let spinner = spinner.clone();
        orchestrator
            .handle_turn(input, &cancel, &mut |token: &str| {
                if !started {
                    spinner.finish_and_clear();
                    started = true;
                }
                print!("{token}");
                let _ = std::io::stdout().flush();
            })
            .await
    };
    watcher.abort();
    spinner.finish_and_clear();

    match result {
        Ok(TurnOutcome::Committed { .. }) => println!("\n"),
        Ok(TurnOutcome::Cancelled) => println!("\n{}\n", "(cancelled)".dimmed()),
        Ok(TurnOutcome::Ignored) => {}
        Err(e) => {
            if started {
                println!();
            }
            eprintln!("{}: {e}", "error".red());
        }
    }
}

fn print_history(turns: &[Turn]) {
    for turn in turns {
        let role = match turn.role {
            Role::System => "system".magenta(),
            Role::User => "user".green(),
            Role::Assistant => "assistant".cyan(),
            Role::Context => "context".yellow(),
        };
        println!(
            "{} {}: {}",
            turn.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            role,
            turn.content
        );
    }
}
