//! Layered normalization of raw reasoning-service output.
//!
//! The remote service only loosely follows the output format its prompt asks
//! for. [`normalize`] tries each layer in a fixed order and the first one that
//! recognizes the text wins:
//!
//! 1. the whole text as a JSON object or array
//! 2. the first fenced block whose contents are a JSON object or array
//! 3. heuristic `isPainPoint: ...` field extraction
//! 4. generated source code
//! 5. anything else non-empty, passed through untouched
//!
//! The resulting [`ParsedResponse`] is then projected onto the shape the
//! caller needs.

pub mod code;
pub mod heuristic;

use ideaforge_core::classification::{
    ClassificationResult, DEFAULT_CONFIDENCE, FALLBACK_CONFIDENCE, ResultMetadata,
};
use ideaforge_core::generation::{Artifact, GenerationResult, MetaTags};
use ideaforge_core::{ForgeError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use code::CodeArtifact;
pub use heuristic::HeuristicFields;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?P<lang>[A-Za-z0-9_+-]*)[ \t]*\r?\n?(?P<body>.*?)```")
        .expect("valid fenced block pattern")
});

/// A triple-backtick block and its (possibly empty) language tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FencedBlock<'a> {
    pub lang: &'a str,
    pub body: &'a str,
}

/// Every fenced block in `text`, in order.
pub(crate) fn fenced_block_parts(text: &str) -> impl Iterator<Item = FencedBlock<'_>> {
    FENCED_BLOCK.captures_iter(text).filter_map(|caps| {
        Some(FencedBlock {
            lang: caps.name("lang").map_or("", |m| m.as_str()),
            body: caps.name("body")?.as_str(),
        })
    })
}

/// Contents of every triple-backtick block in `text`, in order.
pub(crate) fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    fenced_block_parts(text).map(|block| block.body)
}

/// Raw output after format recovery.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// The whole text was JSON.
    Json(Value),
    /// JSON found inside a markdown fence.
    FencedJson(Value),
    /// Fields pulled out of prose.
    Heuristic { fields: HeuristicFields, text: String },
    /// Generated source, already normalized.
    Code(CodeArtifact),
    /// Unrecognized text.
    Opaque(String),
}

impl ParsedResponse {
    /// Name of the layer that produced this response.
    pub fn layer(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::FencedJson(_) => "fenced_json",
            Self::Heuristic { .. } => "heuristic",
            Self::Code(_) => "code",
            Self::Opaque(_) => "opaque",
        }
    }

    fn json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) | Self::FencedJson(value) => Some(value),
            _ => None,
        }
    }

    /// Projects onto a classification result.
    ///
    /// JSON must be an object carrying `isPainPoint`; heuristic matches are
    /// flagged as fallback results. Code and opaque text are parse errors.
    pub fn into_classification(self, metadata: ResultMetadata) -> Result<ClassificationResult> {
        match self {
            Self::Json(value) | Self::FencedJson(value) => classification_from_json(&value, metadata),
            Self::Heuristic { fields, .. } => Ok(ClassificationResult::new(
                fields.is_pain_point,
                fields.reason,
                FALLBACK_CONFIDENCE,
                fields.categories,
                metadata,
            )
            .from_fallback()),
            other => Err(ForgeError::response_parse(format!(
                "expected a classification, got {} output",
                other.layer()
            ))),
        }
    }

    /// Projects onto a generation result. Never fails; unknown shapes become
    /// opaque artifacts.
    pub fn into_generation(self) -> GenerationResult {
        match self {
            Self::Json(value) | Self::FencedJson(value) => generation_from_json(value),
            Self::Code(artifact) => GenerationResult {
                artifact: Artifact::Code {
                    react_code: artifact.react_code,
                },
                dependencies: artifact.dependencies,
                meta_tags: MetaTags::default(),
            },
            Self::Heuristic { text, .. } | Self::Opaque(text) => {
                GenerationResult::with_defaults(Artifact::Opaque { content: text })
            }
        }
    }

    /// Projects onto a typed list: either a bare JSON array or the array
    /// under `key` in a JSON object.
    pub fn into_list<T: DeserializeOwned>(self, key: &str) -> Result<Vec<T>> {
        let layer = self.layer();
        let items = match self.json() {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(map)) => match map.get(key) {
                Some(Value::Array(items)) => items.clone(),
                _ => {
                    return Err(ForgeError::response_parse(format!(
                        "JSON object has no '{key}' array"
                    )));
                }
            },
            _ => {
                return Err(ForgeError::response_parse(format!(
                    "expected a JSON '{key}' list, got {layer} output"
                )));
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|e| {
                    ForgeError::response_parse(format!("invalid '{key}' item {index}: {e}"))
                })
            })
            .collect()
    }
}

/// Runs the layers in order over `raw`.
///
/// Pure: the same text always yields the same response. Only empty or
/// whitespace-only text is an error.
pub fn normalize(raw: &str) -> Result<ParsedResponse> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ForgeError::response_parse("empty response"));
    }

    let parsed = if let Some(value) = parse_json_document(text) {
        ParsedResponse::Json(value)
    } else if let Some(value) = fenced_blocks(text).find_map(|block| parse_json_document(block.trim())) {
        ParsedResponse::FencedJson(value)
    } else if let Some(fields) = heuristic::extract(text) {
        ParsedResponse::Heuristic {
            fields,
            text: text.to_string(),
        }
    } else if let Some(artifact) = code::detect(text) {
        ParsedResponse::Code(artifact)
    } else {
        ParsedResponse::Opaque(text.to_string())
    };

    tracing::debug!(layer = parsed.layer(), len = raw.len(), "Normalized response");
    Ok(parsed)
}

/// Parses `text` as a JSON object or array; scalars don't count.
fn parse_json_document(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(|value| value.is_object() || value.is_array())
}

fn classification_from_json(value: &Value, metadata: ResultMetadata) -> Result<ClassificationResult> {
    let Some(object) = value.as_object() else {
        return Err(ForgeError::response_parse("classification JSON is not an object"));
    };

    let is_pain_point = field(object, &["isPainPoint", "is_pain_point"])
        .and_then(truthy)
        .ok_or_else(|| ForgeError::response_parse("classification JSON has no usable isPainPoint"))?;

    let reason = field(object, &["reason"])
        .map(|v| match v {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
        .unwrap_or_default();

    let confidence = field(object, &["confidence"])
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(DEFAULT_CONFIDENCE);

    let categories = match field(object, &["categories"]) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(ClassificationResult::new(
        is_pain_point,
        reason,
        confidence,
        categories,
        metadata,
    ))
}

fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Some(true),
            "no" | "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

fn generation_from_json(value: Value) -> GenerationResult {
    let meta_tags = value
        .get("metaTags")
        .and_then(|tags| serde_json::from_value::<MetaTags>(tags.clone()).ok())
        .unwrap_or_default();

    let Some(source) = value.get("reactCode").and_then(Value::as_str) else {
        let mut result = GenerationResult::with_defaults(Artifact::Structured { payload: value });
        result.meta_tags = meta_tags;
        return result;
    };

    let artifact = code::normalize(source);
    let mut dependencies = artifact.dependencies;
    if let Some(Value::Object(declared)) = value.get("dependencies") {
        for (package, version) in declared {
            if let Some(version) = version.as_str() {
                dependencies.insert(package.clone(), version.to_string());
            }
        }
    }

    GenerationResult {
        artifact: Artifact::Code {
            react_code: artifact.react_code,
        },
        dependencies,
        meta_tags,
    }
}
