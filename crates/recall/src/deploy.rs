// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall deploy` command implementation.

use colored::Colorize;
use recall_config::RecallConfig;
use recall_core::RecallError;
use recall_storage::Database;

/// Opens the configured database and applies the embedded migrations.
pub async fn run_deploy(config: &RecallConfig) -> Result<(), RecallError> {
    let path = &config.storage.database_path;
    let db = Database::open(path, config.storage.wal_mode).await?;

    let applied = db.applied_migrations();
    if applied.is_empty() {
        println!("schema is up to date ({path})");
    } else {
        for name in applied {
            println!("{} {name}", "applied".green());
        }
        println!("{} migration(s) applied to {path}", applied.len());
    }

    if config.storage.wal_mode {
        db.checkpoint().await?;
    }
    Ok(())
}
