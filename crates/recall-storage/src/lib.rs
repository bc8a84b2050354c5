// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite relational store for recall.
//!
//! Provides the [`SqliteStore`] implementation of `RelationalStore`, the
//! named procedure catalog standing in for server-side stored procedures,
//! and the embedded migrations for the sample `sessions` schema.

pub mod database;
pub mod migrations;
pub mod procedures;
pub mod store;

pub use database::Database;
pub use procedures::{FIND_SIMILAR_SESSIONS, Procedure, ProcedureCatalog};
pub use store::SqliteStore;
