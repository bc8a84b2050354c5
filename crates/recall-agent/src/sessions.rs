// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Independent conversations keyed by caller-chosen session ids.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::orchestrator::{AgentDeps, RetrievalOrchestrator};
use crate::prompt::render_for_today;

/// A shared handle to one conversation.
pub type SessionHandle = Arc<Mutex<RetrievalOrchestrator>>;

/// Owns one [`RetrievalOrchestrator`] per session key.
///
/// Sessions share the adapters in [`AgentDeps`] but never share transcript
/// state. Each session's system prompt is rendered with the date it was
/// created.
pub struct SessionPool {
    deps: AgentDeps,
    prompt_template: String,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionPool {
    pub fn new(deps: AgentDeps, prompt_template: impl Into<String>) -> Self {
        Self {
            deps,
            prompt_template: prompt_template.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `key`, creating it on first use.
    pub async fn session(&self, key: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(key.to_string())
            .or_insert_with(|| {
                info!(session = key, "creating session");
                Arc::new(Mutex::new(RetrievalOrchestrator::new(
                    self.deps.clone(),
                    render_for_today(&self.prompt_template),
                )))
            })
            .clone()
    }

    /// Drops the session for `key`. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> bool {
        self.sessions.lock().await.remove(key).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
