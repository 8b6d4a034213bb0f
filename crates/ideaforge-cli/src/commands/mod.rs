pub mod classify;
pub mod events;
pub mod generate;
pub mod research;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Reads a JSON document from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideaforge_core::research::SourcePost;
    use std::io::Write;

    #[test]
    fn test_read_json_posts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "p1", "title": "Invoices take forever"}}]"#).unwrap();

        let posts: Vec<SourcePost> = read_json(file.path()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].body, "");
    }

    #[test]
    fn test_read_json_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = read_json::<Vec<SourcePost>>(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }
}
