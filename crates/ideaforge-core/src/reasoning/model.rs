//! Reasoning job domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::session::MessageRole;

/// Status of a run as reported by the remote reasoning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
}

/// Lifecycle of a reasoning job.
///
/// `Queued -> Running -> {Completed | Failed | Cancelled | Expired}`; the last
/// four are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl JobStatus {
    /// Whether the job can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired
        )
    }

    /// Whether the job ended without a usable result.
    pub fn is_unsuccessful(self) -> bool {
        self.is_terminal() && self != Self::Completed
    }
}

impl From<RunStatus> for JobStatus {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Queued => Self::Queued,
            // `cancelling` is still in flight until the service confirms it
            RunStatus::InProgress | RunStatus::RequiresAction | RunStatus::Cancelling => {
                Self::Running
            }
            RunStatus::Completed => Self::Completed,
            RunStatus::Failed | RunStatus::Incomplete => Self::Failed,
            RunStatus::Cancelled => Self::Cancelled,
            RunStatus::Expired => Self::Expired,
        }
    }
}

/// A message as listed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub role: MessageRole,
    pub content: String,
}

impl RemoteMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One asynchronous invocation against a freshly created remote session.
///
/// Transient: it lives only for the duration of one call and is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningJob {
    /// Remote run identifier.
    pub id: String,
    /// Remote session (thread) owning the run.
    pub session_id: String,
    /// Agent the run was started with.
    pub agent_id: String,
    pub status: JobStatus,
    /// Final assistant text, set once the job completes.
    pub raw_result: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl ReasoningJob {
    /// Creates a queued job handle.
    pub fn queued(
        id: impl Into<String>,
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            status: JobStatus::Queued,
            raw_result: None,
            submitted_at: Utc::now(),
        }
    }
}
