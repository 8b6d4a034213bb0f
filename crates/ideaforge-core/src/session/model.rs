//! Session domain model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::message::ConversationMessage;

/// A conversational session held in memory for multi-turn chat.
///
/// `last_accessed_at` is bumped by every store access; the sweeper evicts
/// sessions purely on idle time, regardless of who created them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Caller-supplied identifier.
    pub id: String,
    /// Ordered, role-tagged message buffer.
    pub messages: Vec<ConversationMessage>,
    /// System prompt the session was created with.
    pub system_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session at `now`.
    pub fn new(id: impl Into<String>, system_prompt: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            system_prompt,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Marks the session as accessed at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
    }

    /// Time since the last access.
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_accessed_at
    }

    /// Whether the sweeper should evict this session.
    ///
    /// Idle time exactly equal to `max_idle` is still retained.
    pub fn is_stale(&self, now: DateTime<Utc>, max_idle: Duration) -> bool {
        self.idle_for(now) > max_idle
    }
}
