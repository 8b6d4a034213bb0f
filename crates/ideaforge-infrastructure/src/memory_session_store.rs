//! In-memory session store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ideaforge_core::Result;
use ideaforge_core::session::{ConversationMessage, Session, SessionStore};
use tokio::sync::RwLock;

/// Process-local [`SessionStore`] backed by a `HashMap`.
///
/// Cloning yields another handle to the same map.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(session_id).map(|session| {
            session.touch(Utc::now());
            session.clone()
        }))
    }

    async fn set(&self, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_or_create(&self, session_id: &str, system_prompt: Option<&str>) -> Result<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| {
            tracing::debug!(target: "ideaforge::sessions", "Creating session {}", session_id);
            Session::new(session_id, system_prompt.map(str::to_string), now)
        });
        session.touch(now);
        Ok(session.clone())
    }

    async fn append_message(&self, session_id: &str, message: ConversationMessage) -> Result<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id, None, now));
        session.messages.push(message);
        session.touch(now);
        Ok(session.clone())
    }

    async fn remove(&self, session_id: &str) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.sessions.read().await.len())
    }

    async fn sweep_at(&self, now: DateTime<Utc>, max_idle: Duration) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_stale(now, max_idle));
        let evicted = before - sessions.len();

        if evicted > 0 {
            tracing::info!(target: "ideaforge::sessions", "Evicted {} idle session(s)", evicted);
        }
        Ok(evicted)
    }
}
