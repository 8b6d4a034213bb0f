//! Multi-turn conversation memory on top of a [`SessionStore`].

use std::sync::Arc;

use ideaforge_core::Result;
use ideaforge_core::session::{ConversationMessage, MessageRole, Session, SessionStore};
use uuid::Uuid;

/// Records conversation turns in session memory.
pub struct ConversationService {
    store: Arc<dyn SessionStore>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Starts a session under a fresh ID.
    pub async fn start(&self, system_prompt: Option<&str>) -> Result<Session> {
        let session_id = Uuid::new_v4().to_string();
        let session = self.store.get_or_create(&session_id, system_prompt).await?;
        tracing::debug!(session_id = %session.id, "Started conversation");
        Ok(session)
    }

    /// Appends a turn to `session_id`, creating the session on first use.
    pub async fn record(&self, session_id: &str, role: MessageRole, content: &str) -> Result<Session> {
        self.store
            .append_message(session_id, ConversationMessage::new(role, content))
            .await
    }

    /// The session's messages, oldest first; empty for an unknown ID.
    pub async fn history(&self, session_id: &str) -> Result<Vec<ConversationMessage>> {
        Ok(self
            .store
            .get(session_id)
            .await?
            .map(|session| session.messages)
            .unwrap_or_default())
    }

    pub async fn end(&self, session_id: &str) -> Result<()> {
        self.store.remove(session_id).await
    }
}
