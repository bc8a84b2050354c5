// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn control loop: retrieval, context injection, tool-enabled
//! generation, and commit.
//!
//! States per user turn:
//! Idle -> Retrieving -> (ContextInjected | ContextSkipped) -> Generating ->
//! Streaming -> Committed -> Idle.
//!
//! The turn is staged. Context, user, tool-note and assistant turns reach the
//! [`ChatSession`] together once the answer is complete, so a cancelled or
//! failed turn leaves the transcript exactly as it was.

use std::sync::Arc;

use recall_config::RecallConfig;
use recall_core::{
    ContentBlock, ProviderAdapter, ProviderMessage, ProviderRequest, RecallError, Role, Turn,
};
use recall_memory::{MemoryIndex, RetrievalContext};
use recall_query::{ToolOutput, ToolRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chat::ChatSession;
use crate::stream::{FoldOutcome, fold_stream};

/// States of the per-turn FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Retrieving,
    ContextInjected,
    ContextSkipped,
    Generating,
    Streaming,
    Committed,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentState::Idle => write!(f, "idle"),
            AgentState::Retrieving => write!(f, "retrieving"),
            AgentState::ContextInjected => write!(f, "context-injected"),
            AgentState::ContextSkipped => write!(f, "context-skipped"),
            AgentState::Generating => write!(f, "generating"),
            AgentState::Streaming => write!(f, "streaming"),
            AgentState::Committed => write!(f, "committed"),
        }
    }
}

/// How a user turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The answer was committed to the transcript.
    Committed { answer: String },
    /// Blank input; nothing happened.
    Ignored,
    /// The caller cancelled; nothing was committed.
    Cancelled,
}

/// Immutable per-turn parameters.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub model: String,
    pub max_tokens: u32,
    pub memory_limit: usize,
    pub min_relevance: f32,
    pub lead_in: String,
    pub max_tool_iterations: usize,
}

impl TurnSettings {
    pub fn from_config(config: &RecallConfig) -> Self {
        Self {
            model: config.openai.chat_model.clone(),
            max_tokens: config.openai.max_tokens,
            memory_limit: config.memory.limit,
            min_relevance: config.memory.min_relevance,
            lead_in: config.memory.lead_in.clone(),
            max_tool_iterations: config.agent.max_tool_iterations,
        }
    }
}

/// Shared, read-only collaborators of every orchestrator.
#[derive(Clone)]
pub struct AgentDeps {
    pub provider: Arc<dyn ProviderAdapter>,
    /// `None` disables retrieval.
    pub memory: Option<Arc<MemoryIndex>>,
    pub tools: Arc<ToolRegistry>,
    pub settings: TurnSettings,
}

/// Turns staged during one cycle, committed together.
#[derive(Default)]
struct StagedTurn {
    context: Option<String>,
    notes: Vec<String>,
    answer: String,
}

/// Drives one conversation.
pub struct RetrievalOrchestrator {
    session: ChatSession,
    deps: AgentDeps,
    state: AgentState,
}

impl RetrievalOrchestrator {
    /// Creates an orchestrator over a fresh session with `system_prompt`.
    pub fn new(deps: AgentDeps, system_prompt: impl Into<String>) -> Self {
        Self {
            session: ChatSession::new(system_prompt),
            deps,
            state: AgentState::Idle,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Resets the transcript to its system turn.
    pub fn clear_history(&mut self) {
        self.session.reset();
        info!("chat history cleared");
    }

    /// Every turn in order. Side-effect free.
    pub fn history(&self) -> &[Turn] {
        self.session.snapshot()
    }

    fn transition(&mut self, to: AgentState) {
        debug!(from = %self.state, to = %to, "state transition");
        self.state = to;
    }

    /// Runs one user turn, streaming answer fragments to `on_token`.
    ///
    /// Blank input is ignored. Retrieval and tool failures are folded into the
    /// conversation. [`RecallError::CompletionUnavailable`] and
    /// [`RecallError::NoContent`] end the turn without touching the transcript.
    pub async fn handle_turn(
        &mut self,
        input: &str,
        cancel: &CancellationToken,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> Result<TurnOutcome, RecallError> {
        if input.trim().is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        let result = self.run_turn(input, cancel, on_token).await;
        if !matches!(result, Ok(TurnOutcome::Committed { .. })) {
            self.transition(AgentState::Idle);
        }
        result
    }

    async fn run_turn(
        &mut self,
        input: &str,
        cancel: &CancellationToken,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> Result<TurnOutcome, RecallError> {
        let mut staged = StagedTurn::default();

        self.transition(AgentState::Retrieving);
        staged.context = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(TurnOutcome::Cancelled),
            context = self.retrieve(input) => context,
        };
        if staged.context.is_some() {
            self.transition(AgentState::ContextInjected);
        } else {
            self.transition(AgentState::ContextSkipped);
        }

        let mut messages: Vec<ProviderMessage> = self
            .session
            .snapshot()
            .iter()
            .map(Turn::to_provider_message)
            .collect();
        if let Some(context) = &staged.context {
            messages.push(Turn::new(Role::Context, context.as_str()).to_provider_message());
        }
        messages.push(ProviderMessage::text("user", input));

        let definitions = self.deps.tools.definitions();
        let max_iterations = self.deps.settings.max_tool_iterations;

        for iteration in 0..=max_iterations {
            let tools = (iteration < max_iterations && !definitions.is_empty())
                .then(|| definitions.clone());
            let request = ProviderRequest {
                model: self.deps.settings.model.clone(),
                messages: messages.clone(),
                max_tokens: self.deps.settings.max_tokens,
                stream: true,
                tools,
            };

            self.transition(AgentState::Generating);
            let stream = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(TurnOutcome::Cancelled),
                stream = self.deps.provider.stream(request) => stream?,
            };

            self.transition(AgentState::Streaming);
            let generation = match fold_stream(stream, cancel, on_token).await? {
                FoldOutcome::Completed(generation) => generation,
                FoldOutcome::Cancelled => return Ok(TurnOutcome::Cancelled),
            };

            if !generation.has_content {
                return Err(RecallError::NoContent);
            }
            staged.answer.push_str(&generation.text);

            if generation.tool_calls.is_empty() {
                break;
            }
            if iteration >= max_iterations {
                warn!(iterations = iteration, "maximum tool iterations reached");
                break;
            }

            info!(
                tool_count = generation.tool_calls.len(),
                iteration, "executing tool calls"
            );

            let mut assistant_blocks = Vec::new();
            if !generation.text.is_empty() {
                assistant_blocks.push(ContentBlock::Text {
                    text: generation.text.clone(),
                });
            }
            let mut result_blocks = Vec::new();
            for call in &generation.tool_calls {
                assistant_blocks.push(ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.input.clone(),
                });

                let dispatched = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(TurnOutcome::Cancelled),
                    out = self.deps.tools.dispatch(&call.name, call.input.clone()) => out,
                };
                let output = match dispatched {
                    Ok(output) => output,
                    Err(e) => {
                        warn!(tool = call.name.as_str(), error = %e, "tool call failed");
                        staged.notes.push(format!("Tool {} failed: {e}", call.name));
                        ToolOutput::error(e.to_string())
                    }
                };
                result_blocks.push(ContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: output.content,
                    is_error: output.is_error,
                });
            }

            messages.push(ProviderMessage {
                role: "assistant".into(),
                content: assistant_blocks,
            });
            messages.push(ProviderMessage {
                role: "user".into(),
                content: result_blocks,
            });
        }

        self.commit(input, staged)
    }

    /// Searches memory and renders the context turn, if anything cleared the
    /// threshold. Retrieval failures are logged and skipped.
    async fn retrieve(&self, input: &str) -> Option<String> {
        let memory = self.deps.memory.as_ref()?;
        let settings = &self.deps.settings;
        match memory
            .search(input, settings.memory_limit, settings.min_relevance)
            .await
        {
            Ok(hits) => {
                let context = RetrievalContext::from_hits(&settings.lead_in, &hits)?;
                debug!(hits = hits.len(), used = context.len(), "retrieved context");
                Some(context.render())
            }
            Err(e) => {
                warn!(error = %e, "memory search failed, answering without context");
                None
            }
        }
    }

    fn commit(&mut self, input: &str, staged: StagedTurn) -> Result<TurnOutcome, RecallError> {
        if staged.answer.is_empty() {
            warn!("completion produced an empty answer");
        }

        if let Some(context) = &staged.context {
            self.session.append_context(context)?;
        }
        self.session.append_user(input)?;
        for note in &staged.notes {
            self.session.append_context(note)?;
        }
        self.session.append_assistant(&staged.answer);

        self.transition(AgentState::Committed);
        debug!(turns = self.session.len(), "turn committed");
        self.transition(AgentState::Idle);
        Ok(TurnOutcome::Committed {
            answer: staged.answer,
        })
    }
}
