use std::path::Path;

use anyhow::Result;
use ideaforge_application::ForgeApp;
use ideaforge_core::research::{PainPoint, SourcePost};
use tokio_util::sync::CancellationToken;

use super::{print_json, read_json};

pub async fn extract(app: &ForgeApp, posts: &Path, cancel: &CancellationToken) -> Result<()> {
    let posts: Vec<SourcePost> = read_json(posts)?;
    let pain_points = app.research.extract_pain_points(&posts, cancel).await?;
    print_json(&pain_points)
}

pub async fn ideas(app: &ForgeApp, pain_points: &Path, cancel: &CancellationToken) -> Result<()> {
    let pain_points: Vec<PainPoint> = read_json(pain_points)?;
    let ideas = app.research.generate_ideas(&pain_points, cancel).await?;
    print_json(&ideas)
}
