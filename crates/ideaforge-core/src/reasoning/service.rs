//! Remote reasoning service trait.
//!
//! The minimal contract the job client depends on. The HTTP implementation
//! lives in `ideaforge-interaction`; tests supply scripted doubles.

use async_trait::async_trait;

use super::model::{RemoteMessage, RunStatus};
use crate::error::Result;
use crate::session::MessageRole;

/// An asynchronous session/run protocol exposed by a text-generation service.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Opens a new remote session and returns its ID.
    async fn create_session(&self, system_context: Option<&str>) -> Result<String>;

    /// Posts one message into a session.
    async fn post_message(&self, session_id: &str, role: MessageRole, text: &str) -> Result<()>;

    /// Starts a run of `agent_id` over the session and returns the run ID.
    async fn create_run(&self, session_id: &str, agent_id: &str) -> Result<String>;

    /// Fetches the current status of a run.
    async fn get_run_status(&self, run_id: &str, session_id: &str) -> Result<RunStatus>;

    /// Lists the session's messages, oldest first.
    async fn list_messages(&self, session_id: &str) -> Result<Vec<RemoteMessage>>;

    /// Requests cancellation of a run.
    async fn cancel_run(&self, run_id: &str, session_id: &str) -> Result<()>;
}
