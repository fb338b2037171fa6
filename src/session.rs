//! In-memory conversation history, bounded per session.
//!
//! One process-wide store maps session id → ordered turns. Appends for one
//! session never interleave (the map mutex covers each mutation), history
//! is capped FIFO, and nothing survives a restart.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn now(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Process-wide session → turns map with a per-session turn cap.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, VecDeque<ConversationTurn>>>,
    max_turns: usize,
}

impl SessionStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_turns,
        }
    }

    /// Append a turn, evicting the oldest once the cap is exceeded.
    /// The session is created on first append.
    pub fn append(&self, session_id: &str, turn: ConversationTurn) {
        let mut sessions = self.lock();
        let turns = sessions.entry(session_id.to_string()).or_default();
        turns.push_back(turn);
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
    }

    /// Snapshot of a session's turns, oldest first. Unknown ids are empty.
    pub fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        self.lock()
            .get(session_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop one session. Returns whether it existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    /// Drop every session.
    pub fn clear_all(&self) {
        self.lock().clear();
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<ConversationTurn>>> {
        // A poisoned mutex means another thread panicked mid-append; the
        // map itself is still structurally sound, so keep serving.
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
