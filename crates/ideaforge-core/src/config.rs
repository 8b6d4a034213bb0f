//! Runtime configuration model and startup validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL_LABEL: &str = "assistants-v2";

pub const ENV_API_KEY: &str = "IDEAFORGE_API_KEY";
pub const ENV_BASE_URL: &str = "IDEAFORGE_BASE_URL";
pub const ENV_CLASSIFIER_AGENT_ID: &str = "IDEAFORGE_CLASSIFIER_AGENT_ID";
pub const ENV_GENERATOR_AGENT_ID: &str = "IDEAFORGE_GENERATOR_AGENT_ID";
pub const ENV_MODEL_LABEL: &str = "IDEAFORGE_MODEL_LABEL";

/// Longest accepted per-job deadline (one week).
pub const MAX_DEADLINE_SECS: u64 = 7 * 24 * 60 * 60;
/// Longest accepted session idle time (one year).
pub const MAX_IDLE_HOURS: i64 = 365 * 24;

/// Raw configuration as read from file and environment.
///
/// Every field is optional at this stage; [`ForgeConfig::validate`] decides
/// whether the process may start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Agent used for classification and extraction jobs.
    pub classifier_agent_id: Option<String>,
    /// Agent used for idea and landing-page generation jobs.
    pub generator_agent_id: Option<String>,
    /// Label recorded in result metadata.
    pub model_label: Option<String>,
    pub polling: PollSettings,
    pub sessions: SessionSettings,
}

/// Polling budget for reasoning jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    /// Backoff multiplier is capped at `2^max_exponent`.
    pub max_exponent: u32,
    /// Maximum number of status checks; unbounded when `None`.
    pub max_attempts: Option<u32>,
    /// Wall-clock budget per job.
    pub deadline_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1000,
            max_interval_ms: 8000,
            max_exponent: 3,
            max_attempts: None,
            deadline_secs: 300,
        }
    }
}

/// Session memory housekeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub max_idle_hours: i64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_idle_hours: 24,
            sweep_interval_secs: 3600,
        }
    }
}

/// Configuration that passed startup validation.
#[derive(Clone)]
pub struct ValidatedConfig {
    pub api_key: String,
    pub base_url: String,
    pub classifier_agent_id: String,
    pub generator_agent_id: String,
    pub model_label: String,
    pub polling: PollSettings,
    pub sessions: SessionSettings,
}

impl fmt::Debug for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("classifier_agent_id", &self.classifier_agent_id)
            .field("generator_agent_id", &self.generator_agent_id)
            .field("model_label", &self.model_label)
            .field("polling", &self.polling)
            .field("sessions", &self.sessions)
            .finish()
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ForgeConfig {
    /// Checks that the process can start.
    ///
    /// Reports every missing credential or agent ID at once rather than the
    /// first one found.
    pub fn validate(&self) -> Result<ValidatedConfig> {
        let api_key = non_blank(&self.api_key);
        let classifier_agent_id = non_blank(&self.classifier_agent_id);
        let generator_agent_id = non_blank(&self.generator_agent_id);

        let mut missing = Vec::new();
        if api_key.is_none() {
            missing.push(ENV_API_KEY);
        }
        if classifier_agent_id.is_none() {
            missing.push(ENV_CLASSIFIER_AGENT_ID);
        }
        if generator_agent_id.is_none() {
            missing.push(ENV_GENERATOR_AGENT_ID);
        }

        let (Some(api_key), Some(classifier_agent_id), Some(generator_agent_id)) =
            (api_key, classifier_agent_id, generator_agent_id)
        else {
            return Err(ForgeError::configuration(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        };

        if self.polling.initial_interval_ms == 0 {
            return Err(ForgeError::configuration(
                "polling.initial_interval_ms must be greater than zero",
            ));
        }
        if !(1..=MAX_DEADLINE_SECS).contains(&self.polling.deadline_secs) {
            return Err(ForgeError::configuration(format!(
                "polling.deadline_secs must be between 1 and {MAX_DEADLINE_SECS}"
            )));
        }
        if !(1..=MAX_IDLE_HOURS).contains(&self.sessions.max_idle_hours) {
            return Err(ForgeError::configuration(format!(
                "sessions.max_idle_hours must be between 1 and {MAX_IDLE_HOURS}"
            )));
        }
        if self.sessions.sweep_interval_secs == 0 {
            return Err(ForgeError::configuration(
                "sessions.sweep_interval_secs must be greater than zero",
            ));
        }

        Ok(ValidatedConfig {
            api_key,
            base_url: non_blank(&self.base_url).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            classifier_agent_id,
            generator_agent_id,
            model_label: non_blank(&self.model_label)
                .unwrap_or_else(|| DEFAULT_MODEL_LABEL.to_string()),
            polling: self.polling.clone(),
            sessions: self.sessions.clone(),
        })
    }
}
