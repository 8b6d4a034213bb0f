//! Artifact generation model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// npm package name to version range.
pub type Dependencies = BTreeMap<String, String>;

/// Dependencies every generated React artifact needs.
pub fn default_dependencies() -> Dependencies {
    BTreeMap::from([
        ("react".to_string(), "^18.2.0".to_string()),
        ("react-dom".to_string(), "^18.2.0".to_string()),
    ])
}

/// Page-level meta tags for a generated landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaTags {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

impl Default for MetaTags {
    fn default() -> Self {
        Self {
            title: "Landing Page".to_string(),
            description: "A landing page generated by Ideaforge".to_string(),
            keywords: Vec::new(),
        }
    }
}

/// The generated content itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// A JSON landing-page content spec.
    Structured { payload: Value },
    /// React source; always contains an import and a default export.
    Code {
        #[serde(rename = "reactCode")]
        react_code: String,
    },
    /// Text that matched no known shape, passed through untouched.
    Opaque { content: String },
}

/// Result of a generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub artifact: Artifact,
    pub dependencies: Dependencies,
    pub meta_tags: MetaTags,
}

impl GenerationResult {
    /// Wraps an artifact with default dependencies and meta tags.
    pub fn with_defaults(artifact: Artifact) -> Self {
        Self {
            artifact,
            dependencies: default_dependencies(),
            meta_tags: MetaTags::default(),
        }
    }

    /// The React source, if this is a code artifact.
    pub fn react_code(&self) -> Option<&str> {
        match &self.artifact {
            Artifact::Code { react_code } => Some(react_code),
            _ => None,
        }
    }
}

/// Which shape the generation prompt asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    #[default]
    Code,
    Structured,
}

/// Input to landing-page generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingPageSpec {
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    pub description: String,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub output: OutputKind,
}
