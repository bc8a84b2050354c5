// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state and the per-turn retrieval loop.
//!
//! - [`ChatSession`]: the ordered transcript of one conversation
//! - [`RetrievalOrchestrator`]: retrieval, context injection, tool-enabled
//!   generation and commit for each user turn
//! - [`SessionPool`]: independent orchestrators keyed by session id

pub mod chat;
pub mod orchestrator;
pub mod prompt;
pub mod sessions;
pub mod stream;

pub use chat::ChatSession;
pub use orchestrator::{AgentDeps, AgentState, RetrievalOrchestrator, TurnOutcome, TurnSettings};
pub use prompt::{load_system_prompt, render_for_today, render_system_prompt};
pub use sessions::{SessionHandle, SessionPool};
pub use stream::{FoldOutcome, Generation, fold_stream};
