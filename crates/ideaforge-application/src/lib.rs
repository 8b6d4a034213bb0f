//! Application layer for Ideaforge.
//!
//! Builds prompts, runs them as reasoning jobs, and turns whatever comes back
//! into typed results. Also hosts the session-memory use cases and the
//! wiring that ties every layer together.

pub mod artifact_generation_service;
pub mod bootstrap;
pub mod content_classifier_service;
pub mod conversation_service;
pub mod idea_research_service;
pub mod normalizer;
pub mod prompts;
pub mod session_sweeper;

pub use artifact_generation_service::ArtifactGenerationService;
pub use bootstrap::ForgeApp;
pub use content_classifier_service::{ClassifiedPost, ContentClassifierService};
pub use conversation_service::ConversationService;
pub use idea_research_service::IdeaResearchService;
pub use normalizer::{ParsedResponse, normalize};
pub use prompts::PromptBuilder;
pub use session_sweeper::spawn_session_sweeper;
