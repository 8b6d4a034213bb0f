//! Market research entities.
//!
//! Shapes of the pain points and business ideas the prompts ask for. The
//! cardinality rules (at least two items per list, one pain point per idea)
//! live in the prompt text only; nothing here validates them, so downstream
//! trust depends on the remote service following instructions.

use serde::{Deserialize, Deserializer, Serialize};

/// A piece of user-generated content pulled from a community source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Origin platform, e.g. `reddit` or `twitter`.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A recurring problem extracted from source posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PainPoint {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// `low`, `medium` or `high`.
    #[serde(default)]
    pub severity: String,
    /// Number of posts mentioning the problem.
    #[serde(default, deserialize_with = "lenient_count")]
    pub frequency: u32,
    #[serde(default)]
    pub example_quotes: Vec<String>,
    #[serde(default)]
    pub source_post_ids: Vec<String>,
}

/// A product idea addressing exactly one pain point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessIdea {
    pub title: String,
    pub description: String,
    pub related_pain_point_title: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub revenue_streams: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseCount {
    Whole(u64),
    Signed(i64),
    Fractional(f64),
    Text(String),
}

/// Accepts `3`, `3.0`, `"3"` or `null` for a count. Negative values clamp to
/// zero and fractions round to the nearest whole number.
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let from_float = |value: f64| -> Option<u32> {
        value
            .is_finite()
            .then(|| value.round().clamp(0.0, f64::from(u32::MAX)) as u32)
    };

    let count = match Option::<LooseCount>::deserialize(deserializer)? {
        None => Some(0),
        Some(LooseCount::Whole(n)) => Some(u32::try_from(n).unwrap_or(u32::MAX)),
        Some(LooseCount::Signed(_)) => Some(0),
        Some(LooseCount::Fractional(n)) => from_float(n),
        Some(LooseCount::Text(text)) => text.trim().parse::<f64>().ok().and_then(from_float),
    };
    count.ok_or_else(|| serde::de::Error::custom("frequency must be a number"))
}
