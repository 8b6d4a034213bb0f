//! Interaction layer for Ideaforge.
//!
//! HTTP implementations of the remote reasoning service contract.

pub mod assistants_api;

pub use assistants_api::AssistantsApiService;
