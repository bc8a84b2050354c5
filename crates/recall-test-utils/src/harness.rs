// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end turn testing.
//!
//! `TestHarness` assembles a complete orchestrator over mock adapters and an
//! in-memory SQLite memory collection. [`TestHarness::send`] drives one user
//! turn through retrieval, generation, tool calls and commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use recall_agent::{AgentDeps, RetrievalOrchestrator, TurnOutcome, TurnSettings};
use recall_config::model::{QueryConfig, RecallConfig};
use recall_core::{ProviderAdapter, RecallError, RelationalStore};
use recall_memory::{MemoryIndex, MemoryStore};
use recall_query::ToolRegistry;
use tokio_util::sync::CancellationToken;

use crate::mock_embedder::MockEmbedder;
use crate::mock_provider::{MockProvider, MockReply};
use crate::mock_store::MockRelationalStore;

/// Vocabulary used when the builder is given none.
pub const DEFAULT_VOCABULARY: &[&str] = &["premium", "safety", "driving", "claim", "policy"];

/// Opens an in-memory collection and ingests `memories` as `(id, text)` pairs.
pub async fn in_memory_index(
    embedder: Arc<MockEmbedder>,
    memories: &[(&str, &str)],
) -> Result<Arc<MemoryIndex>, RecallError> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
        .await
        .map_err(|e| RecallError::Storage { source: e.into() })?;
    let store = Arc::new(MemoryStore::open(conn, "chat_memories").await?);
    let index = MemoryIndex::new(store, embedder);
    for (id, text) in memories {
        index.ingest(text, id, BTreeMap::new()).await?;
    }
    Ok(Arc::new(index))
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<MockReply>,
    vocabulary: Vec<String>,
    memories: Vec<(String, String)>,
    memory_enabled: bool,
    query_tools: bool,
    system_prompt: String,
    min_relevance: Option<f32>,
    lead_in: Option<String>,
    max_tool_iterations: Option<usize>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            vocabulary: DEFAULT_VOCABULARY.iter().map(|w| w.to_string()).collect(),
            memories: Vec::new(),
            memory_enabled: true,
            query_tools: false,
            system_prompt: "You are a test assistant.".to_string(),
            min_relevance: None,
            lead_in: None,
            max_tool_iterations: None,
        }
    }

    /// Set scripted provider replies.
    pub fn with_replies(mut self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        self.replies = replies.into_iter().collect();
        self
    }

    /// Set the embedder vocabulary.
    pub fn with_vocabulary(mut self, vocabulary: &[&str]) -> Self {
        self.vocabulary = vocabulary.iter().map(|w| w.to_string()).collect();
        self
    }

    /// Add a memory record to ingest before the first turn.
    pub fn with_memory(mut self, id: &str, text: &str) -> Self {
        self.memories.push((id.to_string(), text.to_string()));
        self
    }

    /// Run without a memory index.
    pub fn without_memory(mut self) -> Self {
        self.memory_enabled = false;
        self
    }

    /// Register the default query tools over the mock store.
    pub fn with_query_tools(mut self) -> Self {
        self.query_tools = true;
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    pub fn with_min_relevance(mut self, min_relevance: f32) -> Self {
        self.min_relevance = Some(min_relevance);
        self
    }

    pub fn with_lead_in(mut self, lead_in: &str) -> Self {
        self.lead_in = Some(lead_in.to_string());
        self
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = Some(max);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, RecallError> {
        let config = RecallConfig::default();
        let mut settings = TurnSettings::from_config(&config);
        if let Some(min_relevance) = self.min_relevance {
            settings.min_relevance = min_relevance;
        }
        if let Some(lead_in) = self.lead_in {
            settings.lead_in = lead_in;
        }
        if let Some(max) = self.max_tool_iterations {
            settings.max_tool_iterations = max;
        }

        let vocabulary: Vec<&str> = self.vocabulary.iter().map(String::as_str).collect();
        let embedder = Arc::new(MockEmbedder::new(&vocabulary));
        let memory = if self.memory_enabled {
            let memories: Vec<(&str, &str)> = self
                .memories
                .iter()
                .map(|(id, text)| (id.as_str(), text.as_str()))
                .collect();
            Some(in_memory_index(embedder.clone(), &memories).await?)
        } else {
            None
        };

        let provider = Arc::new(MockProvider::with_replies(self.replies));
        let store = Arc::new(MockRelationalStore::new());

        let tools = if self.query_tools {
            recall_query::build_registry(
                &QueryConfig::default(),
                provider.clone() as Arc<dyn ProviderAdapter>,
                store.clone() as Arc<dyn RelationalStore>,
                &settings.model,
                settings.max_tokens,
            )
            .await?
        } else {
            ToolRegistry::new()
        };

        let deps = AgentDeps {
            provider: provider.clone(),
            memory: memory.clone(),
            tools: Arc::new(tools),
            settings,
        };
        let orchestrator = RetrievalOrchestrator::new(deps.clone(), self.system_prompt);

        Ok(TestHarness {
            provider,
            embedder,
            store,
            memory,
            deps,
            orchestrator,
        })
    }
}

/// A complete test environment with mock adapters.
pub struct TestHarness {
    /// The mock completion service.
    pub provider: Arc<MockProvider>,
    /// The mock embedding service.
    pub embedder: Arc<MockEmbedder>,
    /// The mock relational store behind the query tools.
    pub store: Arc<MockRelationalStore>,
    pub memory: Option<Arc<MemoryIndex>>,
    pub deps: AgentDeps,
    pub orchestrator: RetrievalOrchestrator,
}

impl TestHarness {
    /// Create a builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Runs one turn to completion and returns the outcome together with the
    /// streamed fragments.
    pub async fn send(&mut self, text: &str) -> Result<(TurnOutcome, Vec<String>), RecallError> {
        let cancel = CancellationToken::new();
        let mut tokens = Vec::new();
        let outcome = self
            .orchestrator
            .handle_turn(text, &cancel, &mut |t: &str| tokens.push(t.to_string()))
            .await?;
        Ok((outcome, tokens))
    }

    /// Runs one turn and returns the committed answer.
    pub async fn send_message(&mut self, text: &str) -> Result<String, RecallError> {
        match self.send(text).await?.0 {
            TurnOutcome::Committed { answer } => Ok(answer),
            other => Err(RecallError::Internal(format!(
                "turn was not committed: {other:?}"
            ))),
        }
    }
}
