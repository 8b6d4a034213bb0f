//! Content classification use case.
//!
//! Classification is fail-open: a post that cannot be classified is reported
//! as "not a pain point" with `error` set, so batch ingestion keeps going.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use ideaforge_core::Result;
use ideaforge_core::classification::{ClassificationResult, ResultMetadata};
use ideaforge_core::research::SourcePost;
use ideaforge_execution::ReasoningJobClient;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::normalizer;
use crate::prompts::PromptBuilder;

/// Default number of classification jobs in flight during a batch.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// A batch classification outcome for one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedPost {
    pub post_id: String,
    pub result: ClassificationResult,
}

/// Decides whether posts describe pain points.
pub struct ContentClassifierService {
    jobs: ReasoningJobClient,
    prompts: Arc<PromptBuilder>,
    agent_id: String,
    model_label: String,
    concurrency: usize,
}

impl ContentClassifierService {
    pub fn new(
        jobs: ReasoningJobClient,
        prompts: Arc<PromptBuilder>,
        agent_id: impl Into<String>,
        model_label: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            prompts,
            agent_id: agent_id.into(),
            model_label: model_label.into(),
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Sets how many batch items run at once; zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Classifies one post. Never fails; see the module docs.
    pub async fn classify_content(
        &self,
        title: &str,
        body: &str,
        cancel: &CancellationToken,
    ) -> ClassificationResult {
        match self.try_classify(title, body, cancel).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, title = %title, "Classification failed, defaulting to not a pain point");
                ClassificationResult::fail_open(e.to_string(), self.metadata())
            }
        }
    }

    /// Classifies every post, at most `concurrency` at a time.
    ///
    /// Results come back in input order. One failed post does not affect the
    /// others.
    pub async fn classify_batch(
        &self,
        posts: &[SourcePost],
        cancel: &CancellationToken,
    ) -> Vec<ClassifiedPost> {
        let mut indexed: Vec<(usize, ClassifiedPost)> = stream::iter(posts.iter().enumerate())
            .map(|(index, post)| async move {
                let result = self.classify_content(&post.title, &post.body, cancel).await;
                (
                    index,
                    ClassifiedPost {
                        post_id: post.id.clone(),
                        result,
                    },
                )
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        let classified: Vec<ClassifiedPost> = indexed.into_iter().map(|(_, item)| item).collect();

        tracing::info!(
            total = classified.len(),
            pain_points = classified.iter().filter(|c| c.result.is_pain_point).count(),
            failed = classified.iter().filter(|c| c.result.error).count(),
            "Batch classification finished"
        );
        classified
    }

    async fn try_classify(
        &self,
        title: &str,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<ClassificationResult> {
        let prompt = self.prompts.classification(title, body)?;
        let raw = self.jobs.run(&prompt, &self.agent_id, cancel).await?;
        let parsed = normalizer::normalize(&raw)?;
        let layer = parsed.layer();
        let result = parsed.into_classification(self.metadata())?;

        tracing::debug!(
            layer,
            is_pain_point = result.is_pain_point,
            confidence = result.confidence,
            "Classified content"
        );
        Ok(result)
    }

    fn metadata(&self) -> ResultMetadata {
        ResultMetadata::now(self.model_label.clone())
    }
}
