// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The authoritative, ordered transcript of one conversation.

use recall_core::{RecallError, Role, Turn};

/// Ordered transcript whose first turn is always the system prompt.
///
/// Pure state: no I/O, no async. The length only grows, except through
/// [`ChatSession::reset`].
#[derive(Debug, Clone)]
pub struct ChatSession {
    turns: Vec<Turn>,
}

impl ChatSession {
    /// Starts a transcript holding only `system_prompt`.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::new(Role::System, system_prompt)],
        }
    }

    /// Appends a user turn. Blank text is rejected.
    pub fn append_user(&mut self, text: &str) -> Result<(), RecallError> {
        if text.trim().is_empty() {
            return Err(RecallError::InvalidState(
                "user turn must not be empty".into(),
            ));
        }
        self.turns.push(Turn::new(Role::User, text));
        Ok(())
    }

    /// Appends an assistant turn. Empty text is accepted.
    pub fn append_assistant(&mut self, text: &str) {
        self.turns.push(Turn::new(Role::Assistant, text));
    }

    /// Appends a context turn carrying retrieved knowledge or a tool note.
    pub fn append_context(&mut self, text: &str) -> Result<(), RecallError> {
        if text.trim().is_empty() {
            return Err(RecallError::InvalidState(
                "context turn must not be empty".into(),
            ));
        }
        self.turns.push(Turn::new(Role::Context, text));
        Ok(())
    }

    /// Truncates to the original system turn, kept verbatim.
    pub fn reset(&mut self) {
        self.turns.truncate(1);
    }

    /// Read-only view of every turn in order.
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn system_prompt(&self) -> &str {
        &self.turns[0].content
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: the system turn is never removed.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_system_turn() {
        let session = ChatSession::new("You are helpful.");
        assert_eq!(session.len(), 1);
        assert_eq!(session.snapshot()[0].role, Role::System);
        assert_eq!(session.system_prompt(), "You are helpful.");
    }

    #[test]
    fn blank_user_text_is_invalid_state() {
        let mut session = ChatSession::new("sys");
        for blank in ["", "   ", "\n\t"] {
            let err = session.append_user(blank).unwrap_err();
            assert!(matches!(err, RecallError::InvalidState(_)));
        }
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn empty_assistant_text_is_accepted() {
        let mut session = ChatSession::new("sys");
        session.append_user("hi").unwrap();
        session.append_assistant("");
        assert_eq!(session.len(), 3);
        assert_eq!(session.snapshot()[2].content, "");
    }

    #[test]
    fn pairs_alternate_after_system_turn() {
        let mut session = ChatSession::new("sys");
        let n = 4;
        for i in 0..n {
            session.append_user(&format!("question {i}")).unwrap();
            session.append_assistant(&format!("answer {i}"));
        }

        let turns = session.snapshot();
        assert_eq!(turns.len(), 1 + 2 * n);
        for (i, turn) in turns.iter().enumerate().skip(1) {
            let expected = if i % 2 == 1 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
    }

    #[test]
    fn multiple_context_turns_coexist() {
        let mut session = ChatSession::new("sys");
        session.append_context("fact one").unwrap();
        session.append_context("fact two").unwrap();
        assert!(session.append_context(" ").is_err());
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn reset_restores_system_turn_verbatim() {
        let mut session = ChatSession::new("Today's date is 2024-09-30.");
        let original = session.snapshot()[0].clone();
        session.append_context("ctx").unwrap();
        session.append_user("hi").unwrap();
        session.append_assistant("hello");

        session.reset();
        assert_eq!(session.snapshot(), &[original]);

        session.reset();
        assert_eq!(session.len(), 1);
    }
}
