use std::path::Path;

use anyhow::Result;
use ideaforge_application::ForgeApp;
use ideaforge_core::research::SourcePost;
use tokio_util::sync::CancellationToken;

use super::{print_json, read_json};

pub async fn single(app: &ForgeApp, title: &str, body: &str, cancel: &CancellationToken) -> Result<()> {
    let result = app.classifier.classify_content(title, body, cancel).await;
    print_json(&result)
}

pub async fn batch(app: &ForgeApp, posts: &Path, cancel: &CancellationToken) -> Result<()> {
    let posts: Vec<SourcePost> = read_json(posts)?;
    let results = app.classifier.classify_batch(&posts, cancel).await;
    print_json(&results)
}
