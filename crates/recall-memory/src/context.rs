// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Formatting of search hits into a single context turn.

use crate::types::ScoredMemory;

/// Retrieved knowledge for one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalContext {
    lead_in: String,
    texts: Vec<String>,
}

impl RetrievalContext {
    /// Builds the context from search hits, dropping blank hit texts.
    /// `None` when nothing is left.
    pub fn from_hits(lead_in: &str, hits: &[ScoredMemory]) -> Option<Self> {
        let context = Self {
            lead_in: lead_in.to_string(),
            texts: hits
                .iter()
                .map(|h| h.record.text.trim())
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .collect(),
        };
        (!context.is_empty()).then_some(context)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Lead-in sentence followed by the newline-joined hit texts.
    pub fn render(&self) -> String {
        format!("{}{}", self.lead_in, self.texts.join("\n"))
    }
}
