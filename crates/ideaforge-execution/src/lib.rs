//! Execution layer for Ideaforge.
//!
//! Drives reasoning jobs through the remote session/run protocol under a
//! bounded polling budget, and exposes job lifecycle events to observers.

pub mod job_client;
pub mod poll_policy;
pub mod tracing_layer;

pub use job_client::ReasoningJobClient;
pub use poll_policy::PollPolicy;

/// `tracing` target used for job lifecycle events.
pub const JOB_EVENT_TARGET: &str = "ideaforge::jobs";
