// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process chat history, one bounded ring per user.
//!
//! History is conversational context for the inference call, not ledger
//! state, so it is deliberately not persisted. The map is shared through
//! `AppState` rather than living as a module-level global.

use crate::models::ChatTurn;
use dashmap::DashMap;
use std::collections::VecDeque;

/// Turns retained per user; older turns are evicted from the front.
const MAX_TURNS: usize = 20;

/// Per-user chat history rings.
#[derive(Default)]
pub struct ChatHistory {
    rings: DashMap<String, VecDeque<ChatTurn>>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self {
            rings: DashMap::new(),
        }
    }

    /// Append a turn for `user_key`, evicting the oldest past the cap.
    pub fn append(&self, user_key: &str, turn: ChatTurn) {
        let mut ring = self.rings.entry(user_key.to_string()).or_default();
        ring.push_back(turn);
        while ring.len() > MAX_TURNS {
            ring.pop_front();
        }
    }

    /// The retained turns for `user_key`, oldest first.
    pub fn recent(&self, user_key: &str) -> Vec<ChatTurn> {
        self.rings
            .get(user_key)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop all history for `user_key`.
    pub fn clear(&self, user_key: &str) {
        self.rings.remove(user_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_recent_preserve_order() {
        let history = ChatHistory::new();
        history.append("u@google", ChatTurn::user("hello"));
        history.append("u@google", ChatTurn::assistant("hi there"));

        let turns = history.recent("u@google");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, "user");
        assert_eq!(turns[0].content, "hello");
        assert_eq!(turns[1].role, "assistant");
    }

    #[test]
    fn test_ring_evicts_oldest_past_cap() {
        let history = ChatHistory::new();
        for i in 0..(MAX_TURNS + 5) {
            history.append("u@google", ChatTurn::user(format!("turn {}", i)));
        }

        let turns = history.recent("u@google");
        assert_eq!(turns.len(), MAX_TURNS);
        assert_eq!(turns[0].content, "turn 5");
        assert_eq!(turns.last().unwrap().content, format!("turn {}", MAX_TURNS + 4));
    }

    #[test]
    fn test_users_are_isolated() {
        let history = ChatHistory::new();
        history.append("a@google", ChatTurn::user("from a"));
        history.append("b@github", ChatTurn::user("from b"));

        assert_eq!(history.recent("a@google").len(), 1);
        assert_eq!(history.recent("b@github").len(), 1);
        assert_eq!(history.recent("a@google")[0].content, "from a");
    }

    #[test]
    fn test_clear_drops_only_that_user() {
        let history = ChatHistory::new();
        history.append("a@google", ChatTurn::user("one"));
        history.append("b@github", ChatTurn::user("two"));

        history.clear("a@google");

        assert!(history.recent("a@google").is_empty());
        assert_eq!(history.recent("b@github").len(), 1);
    }
}
