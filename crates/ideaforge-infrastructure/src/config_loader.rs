//! Configuration loading.
//!
//! Reads an optional TOML file, then lets environment variables override it.
//! Loading never decides whether the process may start; that is
//! [`ForgeConfig::validate`]'s job.

use std::path::{Path, PathBuf};

use ideaforge_core::Result;
use ideaforge_core::config::{
    ENV_API_KEY, ENV_BASE_URL, ENV_CLASSIFIER_AGENT_ID, ENV_GENERATOR_AGENT_ID, ENV_MODEL_LABEL,
    ForgeConfig,
};

use crate::paths::ForgePaths;

/// Loads [`ForgeConfig`] from file and environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Creates a loader for the default config file location.
    ///
    /// A missing home directory is not an error here; the loader simply
    /// falls back to environment variables.
    pub fn new() -> Self {
        Self {
            path: ForgePaths::config_file().ok(),
        }
    }

    /// Creates a loader for an explicit config file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Loads configuration using the process environment.
    pub fn load(&self) -> Result<ForgeConfig> {
        self.load_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration using `lookup` for environment variables.
    pub fn load_with<F>(&self, lookup: F) -> Result<ForgeConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.path {
            Some(path) if path.exists() => read_file(path)?,
            Some(path) => {
                tracing::debug!("Config file not found at {}, using environment only", path.display());
                ForgeConfig::default()
            }
            None => ForgeConfig::default(),
        };

        apply_env_overrides(&mut config, lookup);
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Result<ForgeConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Overrides file values with any environment variables that are set.
pub fn apply_env_overrides<F>(config: &mut ForgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let overrides = [
        (ENV_API_KEY, &mut config.api_key),
        (ENV_BASE_URL, &mut config.base_url),
        (ENV_CLASSIFIER_AGENT_ID, &mut config.classifier_agent_id),
        (ENV_GENERATOR_AGENT_ID, &mut config.generator_agent_id),
        (ENV_MODEL_LABEL, &mut config.model_label),
    ];

    for (key, slot) in overrides {
        if let Some(value) = lookup(key) {
            *slot = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_file_uses_environment() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_path(temp_dir.path().join("absent.toml"));
        let vars = env(&[(ENV_API_KEY, "sk-env")]);

        let config = loader.load_with(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert!(config.classifier_agent_id.is_none());
    }

    #[test]
    fn test_environment_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
api_key = "sk-file"
classifier_agent_id = "asst_file_classifier"
generator_agent_id = "asst_file_generator"

[polling]
initial_interval_ms = 250
deadline_secs = 30

[sessions]
max_idle_hours = 12
"#,
        )
        .unwrap();

        let vars = env(&[(ENV_API_KEY, "sk-env")]);
        let config = ConfigLoader::with_path(&path)
            .load_with(|k| vars.get(k).cloned())
            .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.classifier_agent_id.as_deref(), Some("asst_file_classifier"));
        assert_eq!(config.polling.initial_interval_ms, 250);
        assert_eq!(config.polling.max_interval_ms, 8000);
        assert_eq!(config.sessions.max_idle_hours, 12);

        let validated = config.validate().unwrap();
        assert_eq!(validated.generator_agent_id, "asst_file_generator");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "api_key = [").unwrap();

        let err = ConfigLoader::with_path(&path).load_with(|_| None).unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }
}
