//! Infrastructure layer for Ideaforge.
//!
//! Concrete implementations of the domain contracts: the in-memory session
//! store and configuration loading.

pub mod config_loader;
pub mod memory_session_store;
pub mod paths;

pub use config_loader::ConfigLoader;
pub use memory_session_store::InMemorySessionStore;
pub use paths::ForgePaths;
