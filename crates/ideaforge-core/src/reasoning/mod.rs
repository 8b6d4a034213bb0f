//! Reasoning job module.
//!
//! Domain types for jobs submitted to the remote reasoning service, and the
//! service contract itself.

mod model;
pub mod service;

pub use model::{JobStatus, ReasoningJob, RemoteMessage, RunStatus};
pub use service::ReasoningService;
