//! Session memory module.
//!
//! Multi-turn conversational sessions keyed by caller-supplied ID. This memory
//! is independent of the per-call reasoning jobs, which always open a fresh
//! remote session.

mod message;
mod model;
pub mod store;

pub use message::{ConversationMessage, MessageRole};
pub use model::Session;
pub use store::SessionStore;
