// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog of named, precompiled statements callable with bound parameters.
//!
//! SQLite has no stored procedures. The catalog plays that role: callers pick
//! a statement by name and supply named parameters, and values are bound, never
//! spliced into SQL text.

use std::collections::HashMap;

/// Name of the built-in similar-sessions procedure.
pub const FIND_SIMILAR_SESSIONS: &str = "find_similar_sessions";

const FIND_SIMILAR_SESSIONS_SQL: &str = "\
SELECT s.id AS id,
       s.title AS title,
       s.abstract AS abstract,
       s.external_id AS external_id,
       json_extract(s.details, '$.speakers') AS speakers,
       bm25(sessions_fts) AS distance
FROM sessions_fts
JOIN sessions s ON s.id = sessions_fts.rowid
WHERE sessions_fts MATCH :topic
ORDER BY distance, s.id
LIMIT :limit";

/// A named statement and the parameters it binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub name: String,
    pub sql: String,
    /// Parameter names without the leading `:`.
    pub params: Vec<String>,
}

impl Procedure {
    pub fn new(name: impl Into<String>, sql: impl Into<String>, params: &[&str]) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Procedures known to a store, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct ProcedureCatalog {
    procedures: HashMap<String, Procedure>,
}

impl ProcedureCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog matching the schema created by the embedded migrations.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(Procedure::new(
            FIND_SIMILAR_SESSIONS,
            FIND_SIMILAR_SESSIONS_SQL,
            &["topic", "limit"],
        ));
        catalog
    }

    /// Adds or replaces a procedure.
    pub fn register(&mut self, procedure: Procedure) {
        self.procedures.insert(procedure.name.clone(), procedure);
    }

    pub fn get(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.procedures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_similar_sessions() {
        let catalog = ProcedureCatalog::builtin();
        let proc = catalog.get(FIND_SIMILAR_SESSIONS).unwrap();
        assert_eq!(proc.params, vec!["topic", "limit"]);
        assert!(proc.sql.contains(":topic"));
        assert!(proc.sql.contains(":limit"));
    }

    #[test]
    fn register_replaces_by_name() {
        let mut catalog = ProcedureCatalog::new();
        catalog.register(Procedure::new("count", "SELECT 1", &[]));
        catalog.register(Procedure::new("count", "SELECT 2", &[]));
        assert_eq!(catalog.names(), vec!["count"]);
        assert_eq!(catalog.get("count").unwrap().sql, "SELECT 2");
    }
}
