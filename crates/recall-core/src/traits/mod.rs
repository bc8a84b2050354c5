// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external services recall talks to.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod embedding;
pub mod provider;
pub mod relational;

pub use adapter::PluginAdapter;
pub use embedding::EmbeddingAdapter;
pub use provider::{ProviderAdapter, ProviderStream};
pub use relational::RelationalStore;
