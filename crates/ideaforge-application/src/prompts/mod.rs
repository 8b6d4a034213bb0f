//! Prompt construction.
//!
//! Each prompt embeds its input data and a strict output-format contract.
//! Rendering is pure: the same input always yields the same text.

mod templates;

use ideaforge_core::generation::{LandingPageSpec, OutputKind};
use ideaforge_core::research::{PainPoint, SourcePost};
use ideaforge_core::{ForgeError, Result};
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// Post bodies longer than this are cut before embedding.
pub const MAX_BODY_CHARS: usize = 4000;

/// Minimum number of ideas requested per generation call.
pub const MIN_IDEAS: usize = 3;

/// Minimum length of every list field in a generated idea.
pub const MIN_LIST_ITEMS: usize = 2;

const CLASSIFICATION: &str = "classification";
const EXTRACTION: &str = "extraction";
const IDEA_GENERATION: &str = "idea_generation";
const LANDING_PAGE: &str = "landing_page";

#[derive(Serialize)]
struct ClassificationRequest<'a> {
    title: &'a str,
    body: String,
}

#[derive(Serialize)]
struct ExtractionRequest {
    posts: Vec<SourcePost>,
}

#[derive(Serialize)]
struct IdeaGenerationRequest<'a> {
    pain_points: &'a [PainPoint],
    min_ideas: usize,
    min_list_items: usize,
}

#[derive(Serialize)]
struct LandingPageRequest<'a> {
    spec: &'a LandingPageSpec,
    structured: bool,
}

/// Renders the directive text sent to the reasoning service.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    /// Compiles the built-in templates.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);

        for (name, source) in [
            (CLASSIFICATION, templates::CLASSIFICATION),
            (EXTRACTION, templates::EXTRACTION),
            (IDEA_GENERATION, templates::IDEA_GENERATION),
            (LANDING_PAGE, templates::LANDING_PAGE),
        ] {
            env.add_template(name, source)
                .map_err(|e| ForgeError::template(format!("failed to compile '{name}': {e}")))?;
        }

        Ok(Self { env })
    }

    /// Asks whether a single post describes a pain point.
    pub fn classification(&self, title: &str, body: &str) -> Result<String> {
        self.render(
            CLASSIFICATION,
            ClassificationRequest {
                title: title.trim(),
                body: truncate_body(body),
            },
        )
    }

    /// Asks for the pain points expressed across `posts`.
    pub fn extraction(&self, posts: &[SourcePost]) -> Result<String> {
        let posts = posts
            .iter()
            .map(|post| SourcePost {
                body: truncate_body(&post.body),
                ..post.clone()
            })
            .collect();
        self.render(EXTRACTION, ExtractionRequest { posts })
    }

    /// Asks for business ideas, each tied to one of `pain_points`.
    pub fn idea_generation(&self, pain_points: &[PainPoint]) -> Result<String> {
        self.render(
            IDEA_GENERATION,
            IdeaGenerationRequest {
                pain_points,
                min_ideas: MIN_IDEAS,
                min_list_items: MIN_LIST_ITEMS,
            },
        )
    }

    /// Asks for a landing page as React code or a JSON content spec.
    pub fn landing_page(&self, spec: &LandingPageSpec) -> Result<String> {
        self.render(
            LANDING_PAGE,
            LandingPageRequest {
                spec,
                structured: spec.output == OutputKind::Structured,
            },
        )
    }

    fn render<S: Serialize>(&self, name: &str, request: S) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| ForgeError::template(e.to_string()))?;
        let rendered = template
            .render(request)
            .map_err(|e| ForgeError::template(format!("failed to render '{name}': {e}")))?;
        Ok(rendered.trim().to_string())
    }
}

/// Trims `body` and cuts it to [`MAX_BODY_CHARS`] characters.
fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
