use std::path::Path;

use anyhow::{Context, Result};
use ideaforge_application::ForgeApp;
use ideaforge_core::generation::{LandingPageSpec, OutputKind};
use tokio_util::sync::CancellationToken;

use super::{print_json, read_json};

pub async fn run(
    app: &ForgeApp,
    spec: &Path,
    structured: bool,
    code_out: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut spec: LandingPageSpec = read_json(spec)?;
    if structured {
        spec.output = OutputKind::Structured;
    }

    let result = app.generator.generate_artifact(&spec, cancel).await?;

    if let Some(path) = code_out {
        match result.react_code() {
            Some(code) => std::fs::write(path, code)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => tracing::warn!("Generated artifact is not code; nothing written to {}", path.display()),
        }
    }

    print_json(&result)
}
