// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection management, PRAGMA setup and error classification.
//!
//! Every statement runs on tokio-rusqlite's single background thread.
//! Clone the [`tokio_rusqlite::Connection`] handle instead of opening a
//! second connection to the same file.

use std::path::Path;

use recall_core::RecallError;
use rusqlite::ErrorCode;
use tracing::{debug, info};

use crate::migrations;

/// Handle to the SQLite database shared by the relational store and the
/// memory collection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    applied: Vec<String>,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and applies pending
    /// migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, RecallError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RecallError::DataSourceUnavailable {
                        message: format!("cannot create {}: {e}", parent.display()),
                        source: Some(Box::new(e)),
                    }
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| RecallError::DataSourceUnavailable {
                message: format!("cannot open database {path}: {e}"),
                source: Some(Box::new(e)),
            })?;
        let db = Self::setup(conn, wal_mode).await?;
        info!(path, migrations = db.applied.len(), "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database with migrations applied.
    pub async fn open_in_memory() -> Result<Self, RecallError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| RecallError::DataSourceUnavailable {
                message: format!("cannot open in-memory database: {e}"),
                source: Some(Box::new(e)),
            })?;
        Self::setup(conn, false).await
    }

    async fn setup(conn: tokio_rusqlite::Connection, wal_mode: bool) -> Result<Self, RecallError> {
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        let applied = conn
            .call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e| RecallError::Storage {
                source: Box::new(e),
            })?;
        for name in &applied {
            debug!(migration = %name, "applied migration");
        }

        Ok(Self { conn, applied })
    }

    /// The shared connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Migrations applied by this open, oldest first. Empty when the schema
    /// was already current.
    pub fn applied_migrations(&self) -> &[String] {
        &self.applied
    }

    /// Flushes the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), RecallError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Maps a tokio-rusqlite failure outside of query execution to a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> RecallError {
    RecallError::Storage {
        source: Box::new(e),
    }
}

/// True for failures that mean the store itself is unreachable or unusable,
/// as opposed to a problem with the statement.
pub(crate) fn is_connectivity_failure(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => matches!(
            e.code,
            ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::NotADatabase
                | ErrorCode::PermissionDenied
                | ErrorCode::OutOfMemory
                | ErrorCode::DiskFull
                | ErrorCode::ReadOnly
                | ErrorCode::FileLockingProtocolFailed
        ),
        rusqlite::Error::InvalidPath(_) => true,
        _ => false,
    }
}

/// Classifies a failure of caller-supplied query text.
pub(crate) fn classify_query_error(
    query: &str,
    err: tokio_rusqlite::Error<rusqlite::Error>,
) -> RecallError {
    match err {
        tokio_rusqlite::Error::Error(inner) if !is_connectivity_failure(&inner) => {
            RecallError::GeneratedQueryInvalid {
                query: query.to_string(),
                message: inner.to_string(),
            }
        }
        other => unavailable(other),
    }
}

/// Classifies a failure of a catalogued procedure. Nothing here is the
/// caller's query text, so every failure means the data source is unusable.
pub(crate) fn classify_procedure_error(
    name: &str,
    err: tokio_rusqlite::Error<rusqlite::Error>,
) -> RecallError {
    RecallError::DataSourceUnavailable {
        message: format!("procedure {name} failed: {err}"),
        source: Some(Box::new(err)),
    }
}

fn unavailable(err: tokio_rusqlite::Error<rusqlite::Error>) -> RecallError {
    RecallError::DataSourceUnavailable {
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}
