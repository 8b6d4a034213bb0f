//! Domain layer for Ideaforge.
//!
//! Holds the types shared by every other crate: the error taxonomy, runtime
//! configuration, the session memory contract, the remote reasoning service
//! contract and the typed results the pipeline produces.

pub mod classification;
pub mod config;
pub mod error;
pub mod generation;
pub mod reasoning;
pub mod research;
pub mod session;

// Re-export common error type
pub use error::{ForgeError, Result};
