// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory collection with embeddings stored as BLOBs.

use std::collections::BTreeMap;

use recall_config::validation::is_sql_identifier;
use recall_core::RecallError;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::types::{MemoryRecord, blob_to_vec, vec_to_blob};

fn storage_err(e: tokio_rusqlite::Error) -> RecallError {
    RecallError::Storage {
        source: Box::new(e),
    }
}

/// One named collection (table) of memory records.
///
/// The table is created on [`open`](Self::open) if missing. Upserts keep the
/// row's original position, so reads in rowid order are insertion order.
pub struct MemoryStore {
    conn: Connection,
    collection: String,
}

impl MemoryStore {
    /// Opens `collection` on `conn`, creating its table if needed.
    pub async fn open(conn: Connection, collection: &str) -> Result<Self, RecallError> {
        if !is_sql_identifier(collection) {
            return Err(RecallError::Config(format!(
                "memory collection `{collection}` is not a valid table name"
            )));
        }

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {collection} (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{{}}',
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );"
        );
        conn.call(move |conn| conn.execute_batch(&ddl))
            .await
            .map_err(storage_err)?;
        debug!(collection, "memory collection ready");

        Ok(Self {
            conn,
            collection: collection.to_string(),
        })
    }

    /// Name of the backing table.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Inserts or overwrites the record with `id`.
    pub async fn upsert(
        &self,
        id: &str,
        text: &str,
        embedding: &[f32],
        metadata: &BTreeMap<String, String>,
    ) -> Result<(), RecallError> {
        let sql = format!(
            "INSERT INTO {} (id, content, embedding, metadata) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                embedding = excluded.embedding,
                metadata = excluded.metadata,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            self.collection
        );
        let id = id.to_string();
        let text = text.to_string();
        let blob = vec_to_blob(embedding);
        let metadata = serde_json::to_string(metadata).map_err(|e| RecallError::Storage {
            source: Box::new(e),
        })?;

        self.conn
            .call(move |conn| {
                conn.execute(&sql, rusqlite::params![id, text, blob, metadata])?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Fetches a record by id.
    pub async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, RecallError> {
        let sql = format!(
            "SELECT id, content, embedding, metadata, created_at, updated_at FROM {} WHERE id = ?1",
            self.collection
        );
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                conn.query_row(&sql, rusqlite::params![id], row_to_record)
                    .optional()
            })
            .await
            .map_err(storage_err)
    }

    /// Every record in insertion order.
    pub async fn all(&self) -> Result<Vec<MemoryRecord>, RecallError> {
        let sql = format!(
            "SELECT id, content, embedding, metadata, created_at, updated_at FROM {} ORDER BY rowid",
            self.collection
        );
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let records = stmt
                    .query_map([], row_to_record)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
            .map_err(storage_err)
    }

    pub async fn count(&self) -> Result<usize, RecallError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.collection);
        self.conn
            .call(move |conn| {
                let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
                Ok(n as usize)
            })
            .await
            .map_err(storage_err)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let blob: Vec<u8> = row.get(2)?;
    let metadata: String = row.get(3)?;
    Ok(MemoryRecord {
        id: row.get(0)?,
        text: row.get(1)?,
        embedding: blob_to_vec(&blob),
        // Metadata is always written by upsert; unreadable JSON degrades to empty.
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
