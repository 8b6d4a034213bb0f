//! Application wiring.
//!
//! Validates configuration, builds the remote service client and the use-case
//! services, and owns the background session sweeper.

use std::sync::Arc;
use std::time::Duration;

use ideaforge_core::{ForgeError, Result};
use ideaforge_core::config::{ForgeConfig, ValidatedConfig};
use ideaforge_core::reasoning::ReasoningService;
use ideaforge_core::session::SessionStore;
use ideaforge_execution::{PollPolicy, ReasoningJobClient};
use ideaforge_infrastructure::InMemorySessionStore;
use ideaforge_interaction::AssistantsApiService;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::artifact_generation_service::ArtifactGenerationService;
use crate::content_classifier_service::ContentClassifierService;
use crate::conversation_service::ConversationService;
use crate::idea_research_service::IdeaResearchService;
use crate::prompts::PromptBuilder;
use crate::session_sweeper::spawn_session_sweeper;

/// Fully wired application.
pub struct ForgeApp {
    pub classifier: ContentClassifierService,
    pub generator: ArtifactGenerationService,
    pub research: IdeaResearchService,
    pub conversations: ConversationService,
    config: ValidatedConfig,
    sessions: Arc<dyn SessionStore>,
    shutdown: CancellationToken,
    sweeper: Option<JoinHandle<()>>,
}

impl ForgeApp {
    /// Validates `config` and wires the HTTP-backed services.
    ///
    /// Fails with a `Configuration` error listing every missing setting.
    pub fn build(config: &ForgeConfig) -> Result<Self> {
        let config = config.validate()?;
        let service = Arc::new(AssistantsApiService::from_config(&config));
        Self::with_service(config, service)
    }

    /// Wires the services around an arbitrary reasoning service.
    pub fn with_service(config: ValidatedConfig, service: Arc<dyn ReasoningService>) -> Result<Self> {
        let prompts = Arc::new(PromptBuilder::new()?);
        let jobs = ReasoningJobClient::new(service).with_policy(PollPolicy::from(&config.polling));
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

        tracing::info!(
            base_url = %config.base_url,
            model = %config.model_label,
            deadline_secs = config.polling.deadline_secs,
            "Ideaforge initialized"
        );

        Ok(Self {
            classifier: ContentClassifierService::new(
                jobs.clone(),
                prompts.clone(),
                config.classifier_agent_id.clone(),
                config.model_label.clone(),
            ),
            generator: ArtifactGenerationService::new(
                jobs.clone(),
                prompts.clone(),
                config.generator_agent_id.clone(),
            ),
            research: IdeaResearchService::new(
                jobs,
                prompts,
                config.classifier_agent_id.clone(),
                config.generator_agent_id.clone(),
            ),
            conversations: ConversationService::new(sessions.clone()),
            config,
            sessions,
            shutdown: CancellationToken::new(),
            sweeper: None,
        })
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// Starts the background session sweeper. Calling it again is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_session_sweeper(&mut self) -> Result<()> {
        if self.sweeper.is_some() {
            return Ok(());
        }
        let settings = &self.config.sessions;
        if settings.sweep_interval_secs == 0 {
            return Err(ForgeError::configuration(
                "sessions.sweep_interval_secs must be greater than zero",
            ));
        }
        let max_idle = chrono::TimeDelta::try_hours(settings.max_idle_hours).ok_or_else(|| {
            ForgeError::configuration(format!(
                "sessions.max_idle_hours {} is out of range",
                settings.max_idle_hours
            ))
        })?;
        self.sweeper = Some(spawn_session_sweeper(
            self.sessions.clone(),
            Duration::from_secs(settings.sweep_interval_secs),
            max_idle,
            self.shutdown.child_token(),
        ));
        Ok(())
    }

    /// A token cancelled when the application shuts down; pass it to
    /// long-running calls.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Cancels in-flight work and waits for the sweeper to stop.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.sweeper.take()
            && let Err(e) = handle.await
        {
            tracing::error!("Session sweeper task failed: {}", e);
        }
        tracing::info!("Ideaforge shut down");
    }
}
