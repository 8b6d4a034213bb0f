//! Error types for the Ideaforge pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reasoning::JobStatus;

/// A shared error type for the entire Ideaforge pipeline.
///
/// Variants carry owned strings rather than source errors so the type stays
/// `Clone` and can be serialized into API responses.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ForgeError {
    /// Missing or invalid startup configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote job reached a terminal state other than `completed`
    #[error("Remote job {job_id} ended with status '{status}'")]
    RemoteJobTerminal { job_id: String, status: JobStatus },

    /// No normalizer layer could make sense of the response
    #[error("Response parse error: {0}")]
    ResponseParse(String),

    /// A single call to the remote reasoning service failed
    #[error("Remote service error{}: {message}", .status_code.map(|c| format!(" ({c})")).unwrap_or_default())]
    Remote {
        status_code: Option<u16>,
        message: String,
    },

    /// The job did not finish within its wall-clock budget
    #[error("Remote job {job_id} exceeded its deadline after {elapsed_ms}ms")]
    DeadlineExceeded { job_id: String, elapsed_ms: u64 },

    /// The job did not finish within its status-check budget
    #[error("Remote job {job_id} still running after {attempts} status checks")]
    AttemptsExhausted { job_id: String, attempts: u32 },

    /// The caller abandoned the job
    #[error("Remote job {job_id} was cancelled by the caller")]
    Cancelled { job_id: String },

    /// Prompt template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// A generation call failed; `context` says which step
    #[error("{context}: {source}")]
    Generation {
        context: String,
        source: Box<ForgeError>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ForgeError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a ResponseParse error
    pub fn response_parse(message: impl Into<String>) -> Self {
        Self::ResponseParse(message.into())
    }

    /// Creates a Remote error
    pub fn remote(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a Template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps this error with generation context.
    pub fn in_generation(self, context: impl Into<String>) -> Self {
        Self::Generation {
            context: context.into(),
            source: Box::new(self),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a parse error
    pub fn is_response_parse(&self) -> bool {
        matches!(self, Self::ResponseParse(_))
    }

    /// Check if the remote job ended unsuccessfully
    pub fn is_remote_terminal(&self) -> bool {
        matches!(self, Self::RemoteJobTerminal { .. })
    }

    /// Check if the job was stopped locally (deadline, attempts or caller cancellation).
    pub fn is_abandoned(&self) -> bool {
        matches!(
            self,
            Self::DeadlineExceeded { .. } | Self::AttemptsExhausted { .. } | Self::Cancelled { .. }
        )
    }

    /// Returns the innermost error, unwrapping generation context.
    pub fn root_cause(&self) -> &ForgeError {
        match self {
            Self::Generation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ForgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ForgeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ForgeError>`.
pub type Result<T> = std::result::Result<T, ForgeError>;
