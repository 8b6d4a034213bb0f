//! Best-effort field extraction from free text.
//!
//! Used when a classification response is neither JSON nor fenced JSON, e.g.
//! `isPainPoint: yes because users are frustrated`.

use once_cell::sync::Lazy;
use regex::Regex;

static IS_PAIN_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)["']?is[_\s-]?pain[_\s-]?point["']?\s*[:=]\s*["']?(yes|no|true|false)\b["']?"#)
        .expect("valid isPainPoint pattern")
});

static REASON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?im)["']?reason["']?\s*[:=]\s*["']?([^"\n]+)"#).expect("valid reason pattern")
});

static CATEGORIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?im)["']?categories["']?\s*[:=]\s*\[?([^\]\n]+)\]?"#)
        .expect("valid categories pattern")
});

/// Fields recovered from prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicFields {
    pub is_pain_point: bool,
    pub reason: String,
    pub categories: Vec<String>,
}

/// Extracts classification fields; `None` unless the `isPainPoint` marker is
/// present.
pub fn extract(text: &str) -> Option<HeuristicFields> {
    let marker = IS_PAIN_POINT.captures(text)?;
    let verdict = marker.get(1)?.as_str().to_ascii_lowercase();
    let is_pain_point = matches!(verdict.as_str(), "yes" | "true");

    let reason = REASON
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_value(m.as_str()))
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| {
            let end = marker.get(0).map_or(0, |m| m.end());
            let rest = clean_value(&text[end..]);
            if rest.is_empty() {
                text.trim().to_string()
            } else {
                rest
            }
        });

    let categories = CATEGORIES
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .split(',')
                .map(clean_value)
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Some(HeuristicFields {
        is_pain_point,
        reason,
        categories,
    })
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_start_matches([',', ';', '.', '-', ':'])
        .trim_end_matches([',', ';', '"', '\'', '}'])
        .trim()
        .trim_matches(['"', '\''])
        .to_string()
}
