// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`RelationalStore`].

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rusqlite::ToSql;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::Value;
use tracing::debug;

use recall_config::model::StorageConfig;
use recall_core::{NamedParams, PluginAdapter, RecallError, RelationalStore, Row};

use crate::database::{self, Database};
use crate::procedures::ProcedureCatalog;

/// Relational store backed by a SQLite database.
///
/// Query text is prepared verbatim. Procedures come from a
/// [`ProcedureCatalog`] and only ever see bound parameters.
pub struct SqliteStore {
    db: Database,
    catalog: ProcedureCatalog,
    wal_mode: bool,
}

impl SqliteStore {
    /// Opens the configured database with the built-in procedure catalog.
    pub async fn open(config: &StorageConfig) -> Result<Self, RecallError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self {
            db,
            catalog: ProcedureCatalog::builtin(),
            wal_mode: config.wal_mode,
        })
    }

    /// Wraps an already opened database.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            catalog: ProcedureCatalog::builtin(),
            wal_mode: false,
        }
    }

    /// Replaces the procedure catalog.
    pub fn with_catalog(mut self, catalog: ProcedureCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// The underlying database, for components sharing the connection.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn catalog(&self) -> &ProcedureCatalog {
        &self.catalog
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        if self.wal_mode {
            self.db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl RelationalStore for SqliteStore {
    async fn execute(&self, query: &str) -> Result<Vec<Row>, RecallError> {
        let sql = query.to_string();
        let rows = self
            .db
            .connection()
            .call(move |conn| -> Result<Vec<Row>, rusqlite::Error> {
                let mut stmt = conn.prepare(&sql)?;
                collect_rows(&mut stmt, [])
            })
            .await
            .map_err(|e| database::classify_query_error(query, e))?;
        debug!(rows = rows.len(), "query executed");
        Ok(rows)
    }

    async fn call_procedure(
        &self,
        name: &str,
        params: NamedParams,
    ) -> Result<Vec<Row>, RecallError> {
        let procedure = self.catalog.get(name).cloned().ok_or_else(|| {
            RecallError::DataSourceUnavailable {
                message: format!("unknown procedure `{name}`"),
                source: None,
            }
        })?;

        if let Some(extra) = params.keys().find(|k| !procedure.params.contains(*k)) {
            return Err(RecallError::InvalidState(format!(
                "procedure `{name}` has no parameter `{extra}`"
            )));
        }

        let mut bound = Vec::with_capacity(procedure.params.len());
        for param in &procedure.params {
            let value = params.get(param).ok_or_else(|| {
                RecallError::InvalidState(format!(
                    "procedure `{name}` requires parameter `{param}`"
                ))
            })?;
            bound.push((format!(":{param}"), json_to_sql(value)));
        }

        let rows = self
            .db
            .connection()
            .call(move |conn| -> Result<Vec<Row>, rusqlite::Error> {
                let mut stmt = conn.prepare_cached(&procedure.sql)?;
                let named: Vec<(&str, &dyn ToSql)> = bound
                    .iter()
                    .map(|(k, v)| (k.as_str(), v as &dyn ToSql))
                    .collect();
                collect_rows(&mut stmt, named.as_slice())
            })
            .await
            .map_err(|e| database::classify_procedure_error(name, e))?;
        debug!(procedure = name, rows = rows.len(), "procedure called");
        Ok(rows)
    }
}

fn collect_rows<P: rusqlite::Params>(
    stmt: &mut rusqlite::Statement<'_>,
    params: P,
) -> Result<Vec<Row>, rusqlite::Error> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (i, column) in columns.iter().enumerate() {
            record.insert(column.clone(), sql_to_json(row.get_ref(i)?));
        }
        out.push(record);
    }
    Ok(out)
}

/// Converts a column value to JSON. Blobs become base64 strings.
fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(BASE64.encode(b)),
    }
}

/// Converts a JSON parameter to a bindable value. Arrays and objects bind as
/// JSON text.
fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}
