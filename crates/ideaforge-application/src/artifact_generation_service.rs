//! Landing-page artifact generation use case.
//!
//! Unlike classification, generation fails wholesale: every error is returned
//! with the step that produced it.

use std::sync::Arc;

use ideaforge_core::Result;
use ideaforge_core::generation::{Artifact, GenerationResult, LandingPageSpec};
use ideaforge_execution::ReasoningJobClient;
use tokio_util::sync::CancellationToken;

use crate::normalizer;
use crate::prompts::PromptBuilder;

/// Generates landing pages as React code or structured content.
pub struct ArtifactGenerationService {
    jobs: ReasoningJobClient,
    prompts: Arc<PromptBuilder>,
    agent_id: String,
}

impl ArtifactGenerationService {
    pub fn new(jobs: ReasoningJobClient, prompts: Arc<PromptBuilder>, agent_id: impl Into<String>) -> Self {
        Self {
            jobs,
            prompts,
            agent_id: agent_id.into(),
        }
    }

    /// Runs a generation job for `spec` and normalizes its output.
    pub async fn generate_artifact(
        &self,
        spec: &LandingPageSpec,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        let prompt = self
            .prompts
            .landing_page(spec)
            .map_err(|e| e.in_generation("Failed to build landing page prompt"))?;

        let raw = self
            .jobs
            .run(&prompt, &self.agent_id, cancel)
            .await
            .map_err(|e| e.in_generation(format!("Generation job for '{}' failed", spec.title)))?;

        let parsed = normalizer::normalize(&raw)
            .map_err(|e| e.in_generation("Failed to normalize generated artifact"))?;
        let layer = parsed.layer();
        let result = parsed.into_generation();

        tracing::info!(
            title = %spec.title,
            layer,
            kind = artifact_kind(&result.artifact),
            dependencies = result.dependencies.len(),
            "Generated artifact"
        );
        Ok(result)
    }
}

fn artifact_kind(artifact: &Artifact) -> &'static str {
    match artifact {
        Artifact::Structured { .. } => "structured",
        Artifact::Code { .. } => "code",
        Artifact::Opaque { .. } => "opaque",
    }
}
