//! Pain-point extraction and idea generation use cases.

use std::sync::Arc;

use ideaforge_core::Result;
use ideaforge_core::research::{BusinessIdea, PainPoint, SourcePost};
use ideaforge_execution::ReasoningJobClient;
use tokio_util::sync::CancellationToken;

use crate::normalizer;
use crate::prompts::PromptBuilder;

/// Turns source posts into pain points and pain points into business ideas.
///
/// Errors propagate: a response that isn't a usable JSON list is a
/// `ResponseParse` error, not an empty result.
pub struct IdeaResearchService {
    jobs: ReasoningJobClient,
    prompts: Arc<PromptBuilder>,
    /// Agent used for extraction
    analyst_agent_id: String,
    /// Agent used for idea generation
    generator_agent_id: String,
}

impl IdeaResearchService {
    pub fn new(
        jobs: ReasoningJobClient,
        prompts: Arc<PromptBuilder>,
        analyst_agent_id: impl Into<String>,
        generator_agent_id: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            prompts,
            analyst_agent_id: analyst_agent_id.into(),
            generator_agent_id: generator_agent_id.into(),
        }
    }

    /// Extracts the pain points expressed across `posts`.
    pub async fn extract_pain_points(
        &self,
        posts: &[SourcePost],
        cancel: &CancellationToken,
    ) -> Result<Vec<PainPoint>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = self.prompts.extraction(posts)?;
        let raw = self.jobs.run(&prompt, &self.analyst_agent_id, cancel).await?;
        let pain_points: Vec<PainPoint> = normalizer::normalize(&raw)?.into_list("painPoints")?;

        tracing::info!(posts = posts.len(), pain_points = pain_points.len(), "Extracted pain points");
        Ok(pain_points)
    }

    /// Generates business ideas, each tied to one of `pain_points`.
    pub async fn generate_ideas(
        &self,
        pain_points: &[PainPoint],
        cancel: &CancellationToken,
    ) -> Result<Vec<BusinessIdea>> {
        if pain_points.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = self.prompts.idea_generation(pain_points)?;
        let raw = self.jobs.run(&prompt, &self.generator_agent_id, cancel).await?;
        let ideas: Vec<BusinessIdea> = normalizer::normalize(&raw)?.into_list("ideas")?;

        let unmatched = ideas
            .iter()
            .filter(|idea| {
                !pain_points
                    .iter()
                    .any(|p| p.title == idea.related_pain_point_title)
            })
            .count();
        if unmatched > 0 {
            tracing::warn!(unmatched, "Some ideas reference pain points that were not provided");
        }

        tracing::info!(pain_points = pain_points.len(), ideas = ideas.len(), "Generated ideas");
        Ok(ideas)
    }
}
