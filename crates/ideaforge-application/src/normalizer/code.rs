//! Code-artifact detection and normalization.
//!
//! A best-effort text transform, not a parser. The one guarantee it keeps is
//! that the normalized source has an import statement and a default export.

use ideaforge_core::generation::{Dependencies, default_dependencies};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{FencedBlock, fenced_block_parts};

/// Name given to components synthesized around bare markup.
pub const FALLBACK_COMPONENT: &str = "GeneratedPage";

const DEFAULT_IMPORT: &str = "import React from 'react';";

/// Fence tags marking a block as component source.
const SCRIPT_LANGS: &[&str] = &["jsx", "tsx", "js", "ts", "javascript", "typescript", "react"];

/// Name endings that mark a component as the page itself.
const ROOT_SUFFIXES: &[&str] = &["Page", "Landing", "App", "Home", "Site"];

static CODE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:import\s|export\s|function\s|const\s|let\s|class\s|['"]use client['"])"#)
        .expect("valid code start pattern")
});

static MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[A-Za-z][A-Za-z0-9.]*(?:\s[^<>]*)?/?>|</[A-Za-z][A-Za-z0-9.]*>")
        .expect("valid markup pattern")
});

static FENCE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("valid fence pattern"));

static ARROW_COMPONENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^(?P<export>export\s+(?:default\s+)?)?const\s+(?P<name>[A-Z][A-Za-z0-9_]*)\s*(?::\s*[A-Za-z0-9_.<>]+\s*)?=\s*(?:\((?P<params>[^)]*)\)|(?P<param>[A-Za-z_][A-Za-z0-9_]*))\s*=>\s*(?P<open>[{(])",
    )
    .expect("valid arrow component pattern")
});

static COMPONENT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+(?:default\s+)?)?(?:function|class)\s+(?P<name>[A-Z][A-Za-z0-9_]*)")
        .expect("valid component declaration pattern")
});

static ARROW_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:export\s+)?const\s+(?P<name>[A-Z][A-Za-z0-9_]*)\s*(?::[^=\n]+)?=\s*(?:\([^)]*\)|[A-Za-z_][A-Za-z0-9_]*)\s*=>",
    )
    .expect("valid arrow declaration pattern")
});

static IMPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*import\s").expect("valid import pattern"));

static DEFAULT_EXPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bexport\s+default\b").expect("valid default export pattern"));

static IMPORT_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[^'"]*?\s+from\s+)?['"](?P<source>[^'"]+)['"]"#)
        .expect("valid import source pattern")
});

/// Normalized generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeArtifact {
    pub react_code: String,
    pub dependencies: Dependencies,
}

/// Whether `text` looks like generated source code.
pub fn looks_like_code(text: &str) -> bool {
    let body = strip_fences(text);
    starts_like_code(&body) || MARKUP.is_match(&body)
}

fn starts_like_code(body: &str) -> bool {
    CODE_START.is_match(body.trim_start())
}

/// Treats `text` as code if it looks like it.
pub fn detect(text: &str) -> Option<CodeArtifact> {
    looks_like_code(text).then(|| normalize(text))
}

/// Normalizes `source` into a self-contained component module.
pub fn normalize(source: &str) -> CodeArtifact {
    let mut code = strip_fences(source).trim().to_string();

    code = rewrite_arrow_components(&code);

    if needs_markup_wrapper(&code) {
        code = wrap_markup(&code);
    }

    if !IMPORT_LINE.is_match(&code) {
        code = format!("{DEFAULT_IMPORT}\n\n{code}");
    }

    if !DEFAULT_EXPORT.is_match(&code) {
        match root_component_name(&code) {
            Some(name) => code = format!("{code}\n\nexport default {name};"),
            None => {
                code = format!(
                    "{code}\n\nexport default function {FALLBACK_COMPONENT}() {{\n  return null;\n}}"
                )
            }
        }
    }
    code.push('\n');

    let dependencies = detect_dependencies(&code);
    CodeArtifact {
        react_code: code,
        dependencies,
    }
}

/// Picks the fenced block most likely to hold the component, or returns
/// `text` with stray fence lines removed when there are no blocks.
///
/// Preference order: a script-tagged block that looks like code, any block
/// starting like code, any block with markup, then the first block.
pub fn strip_fences(text: &str) -> String {
    let blocks: Vec<FencedBlock<'_>> = fenced_block_parts(text).collect();
    let is_script = |block: &FencedBlock<'_>| {
        SCRIPT_LANGS
            .iter()
            .any(|lang| block.lang.eq_ignore_ascii_case(lang))
    };

    let chosen = blocks
        .iter()
        .find(|b| is_script(*b) && (starts_like_code(b.body) || MARKUP.is_match(b.body)))
        .or_else(|| blocks.iter().find(|b| starts_like_code(b.body)))
        .or_else(|| blocks.iter().find(|b| MARKUP.is_match(b.body)))
        .or_else(|| blocks.first());

    match chosen {
        Some(block) => block.body.to_string(),
        None => FENCE_LINE.replace_all(text, "").into_owned(),
    }
}

/// Rewrites `const Name = (props) => ...` components as named functions.
fn rewrite_arrow_components(code: &str) -> String {
    let mut code = code.to_string();
    // Each successful rewrite removes the match, so this terminates; a match
    // we cannot rewrite is skipped by advancing `from`.
    let mut from = 0;
    loop {
        let (end, rewritten) = {
            let Some(caps) = ARROW_COMPONENT.captures_at(&code, from) else {
                break;
            };
            let end = caps.get(0).map_or(code.len(), |m| m.end());
            (end, rewrite_one(&code, &caps))
        };
        match rewritten {
            Some(rewritten) => code = rewritten,
            None => from = end,
        }
    }
    code
}

fn rewrite_one(code: &str, caps: &Captures<'_>) -> Option<String> {
    let whole = caps.get(0)?;
    let export = caps.name("export").map_or("", |m| m.as_str());
    let name = caps.name("name")?.as_str();
    let params = caps
        .name("params")
        .or_else(|| caps.name("param"))
        .map_or("", |m| m.as_str());
    let open = caps.name("open")?;

    if open.as_str() == "{" {
        let header = format!("{export}function {name}({params}) {{");
        return Some(format!(
            "{}{}{}",
            &code[..whole.start()],
            header,
            &code[whole.end()..]
        ));
    }

    // Parenthesized body: `=> ( <jsx/> )` becomes `{ return ( <jsx/> ); }`
    let close = matching_paren(code, open.start())?;
    let mut after = close + 1;
    if code[after..].starts_with(';') {
        after += 1;
    }
    Some(format!(
        "{}{export}function {name}({params}) {{\n  return {};\n}}{}",
        &code[..whole.start()],
        &code[open.start()..=close],
        &code[after..]
    ))
}

/// Byte index of the `)` matching the `(` at `open`.
fn matching_paren(code: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, ch) in code[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn needs_markup_wrapper(code: &str) -> bool {
    if COMPONENT_DECL.is_match(code) || DEFAULT_EXPORT.is_match(code) {
        return false;
    }
    body_without_imports(code).trim_start().starts_with('<')
}

fn body_without_imports(code: &str) -> String {
    code.lines()
        .filter(|line| !line.trim_start().starts_with("import "))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_markup(code: &str) -> String {
    let imports: Vec<&str> = code
        .lines()
        .filter(|line| line.trim_start().starts_with("import "))
        .collect();
    let markup = body_without_imports(code);
    let indented = markup
        .trim()
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n");

    let component = format!(
        "function {FALLBACK_COMPONENT}() {{\n  return (\n    <>\n{indented}\n    </>\n  );\n}}"
    );
    if imports.is_empty() {
        component
    } else {
        format!("{}\n\n{component}", imports.join("\n"))
    }
}

/// The component to export by default.
///
/// A name ending like a page (`LandingPage`, `App`) wins; otherwise the first
/// component no other markup renders; otherwise the first one declared.
fn root_component_name(code: &str) -> Option<String> {
    let mut declared: Vec<(usize, &str)> = COMPONENT_DECL
        .captures_iter(code)
        .chain(ARROW_DECL.captures_iter(code))
        .filter_map(|caps| caps.name("name"))
        .map(|m| (m.start(), m.as_str()))
        .collect();
    declared.sort_by_key(|(start, _)| *start);
    declared.dedup_by(|a, b| a.1 == b.1);
    let names: Vec<&str> = declared.into_iter().map(|(_, name)| name).collect();

    let rendered = |name: &str| {
        MARKUP
            .find_iter(code)
            .any(|tag| tag.as_str().strip_prefix('<').is_some_and(|rest| {
                rest.strip_prefix(name)
                    .is_some_and(|after| !after.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_'))
            }))
    };

    names
        .iter()
        .find(|name| ROOT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
        .or_else(|| names.iter().find(|name| !rendered(**name)))
        .or_else(|| names.first())
        .map(|name| name.to_string())
}

/// Default dependencies plus every bare package the code imports.
fn detect_dependencies(code: &str) -> Dependencies {
    let mut dependencies = default_dependencies();
    for caps in IMPORT_SOURCE.captures_iter(code) {
        let Some(source) = caps.name("source").map(|m| m.as_str()) else {
            continue;
        };
        if let Some(package) = package_name(source) {
            dependencies
                .entry(package)
                .or_insert_with(|| "latest".to_string());
        }
    }
    dependencies
}

/// `@scope/pkg/sub` -> `@scope/pkg`, `pkg/sub` -> `pkg`; relative paths and
/// stylesheets are not packages.
fn package_name(source: &str) -> Option<String> {
    if source.starts_with('.') || source.starts_with('/') || source.ends_with(".css") {
        return None;
    }
    let mut parts = source.split('/');
    let first = parts.next()?;
    if first.is_empty() {
        return None;
    }
    if first.starts_with('@') {
        let second = parts.next()?;
        Some(format!("{first}/{second}"))
    } else {
        Some(first.to_string())
    }
}
