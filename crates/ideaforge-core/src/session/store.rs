//! Session store trait.
//!
//! Defines the interface for the multi-turn session memory.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::message::ConversationMessage;
use super::model::Session;
use crate::error::Result;

/// An abstract store of conversational sessions.
///
/// Implementations may be backed by process memory, a distributed cache or a
/// test double. Every read through the store counts as an access and bumps
/// `last_accessed_at`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session with the given ID, touching it.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    async fn get(&self, session_id: &str) -> Result<Option<Session>>;

    /// Inserts or replaces a session as-is, without touching it.
    async fn set(&self, session: Session) -> Result<()>;

    /// Returns the existing session or creates one with `system_prompt`.
    ///
    /// Always updates `last_accessed_at`. An existing session keeps its
    /// original system prompt.
    async fn get_or_create(&self, session_id: &str, system_prompt: Option<&str>) -> Result<Session>;

    /// Appends a message, creating the session if needed.
    async fn append_message(&self, session_id: &str, message: ConversationMessage) -> Result<Session>;

    /// Removes a session. Removing an unknown ID is not an error.
    async fn remove(&self, session_id: &str) -> Result<()>;

    /// Number of live sessions.
    async fn count(&self) -> Result<usize>;

    /// Deletes every session idle for longer than `max_idle` as of `now`.
    ///
    /// Returns the number of evicted sessions.
    async fn sweep_at(&self, now: DateTime<Utc>, max_idle: Duration) -> Result<usize>;

    /// Deletes every session idle for longer than `max_idle`.
    async fn sweep(&self, max_idle: Duration) -> Result<usize> {
        self.sweep_at(Utc::now(), max_idle).await
    }
}
