//! End-to-end pipeline tests against a scripted reasoning service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ideaforge_application::{
    ArtifactGenerationService, ContentClassifierService, ForgeApp, IdeaResearchService,
    PromptBuilder,
};
use ideaforge_core::config::ForgeConfig;
use ideaforge_core::generation::{Artifact, LandingPageSpec};
use ideaforge_core::reasoning::{ReasoningService, RemoteMessage, RunStatus};
use ideaforge_core::research::{PainPoint, SourcePost};
use ideaforge_core::session::MessageRole;
use ideaforge_core::{ForgeError, Result};
use ideaforge_execution::{PollPolicy, ReasoningJobClient};
use tokio_util::sync::CancellationToken;

/// Response that makes the stub end the run as `failed`.
const FAIL_RUN: &str = "<<fail run>>";

type Responder = Box<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Default)]
struct Thread {
    prompt: String,
    response: Option<String>,
    checks: u32,
}

/// Answers each prompt with `responder(prompt)` after a few `in_progress`
/// status checks.
struct StubService {
    responder: Responder,
    running_checks: u32,
    threads: Mutex<HashMap<String, Thread>>,
    next_id: AtomicU32,
    status_checks: AtomicU32,
}

impl StubService {
    fn new(responder: impl Fn(&str) -> String + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            running_checks: 2,
            threads: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(0),
            status_checks: AtomicU32::new(0),
        })
    }

    fn replying(text: &'static str) -> Arc<Self> {
        Self::new(move |_| text.to_string())
    }

    fn prompts(&self) -> Vec<String> {
        self.threads
            .lock()
            .unwrap()
            .values()
            .map(|t| t.prompt.clone())
            .collect()
    }
}

#[async_trait]
impl ReasoningService for StubService {
    async fn create_session(&self, _system_context: Option<&str>) -> Result<String> {
        let id = format!("thread_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.threads.lock().unwrap().insert(id.clone(), Thread::default());
        Ok(id)
    }

    async fn post_message(&self, session_id: &str, _role: MessageRole, text: &str) -> Result<()> {
        let mut threads = self.threads.lock().unwrap();
        let thread = threads
            .get_mut(session_id)
            .ok_or_else(|| ForgeError::remote(Some(404), "no such thread"))?;
        thread.prompt = text.to_string();
        Ok(())
    }

    async fn create_run(&self, session_id: &str, _agent_id: &str) -> Result<String> {
        let mut threads = self.threads.lock().unwrap();
        let thread = threads
            .get_mut(session_id)
            .ok_or_else(|| ForgeError::remote(Some(404), "no such thread"))?;
        thread.response = Some((self.responder)(&thread.prompt));
        Ok(format!("run_{session_id}"))
    }

    async fn get_run_status(&self, _run_id: &str, session_id: &str) -> Result<RunStatus> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        let mut threads = self.threads.lock().unwrap();
        let thread = threads
            .get_mut(session_id)
            .ok_or_else(|| ForgeError::remote(Some(404), "no such thread"))?;
        thread.checks += 1;
        if thread.checks <= self.running_checks {
            return Ok(RunStatus::InProgress);
        }
        match thread.response.as_deref() {
            Some(FAIL_RUN) => Ok(RunStatus::Failed),
            _ => Ok(RunStatus::Completed),
        }
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<RemoteMessage>> {
        let threads = self.threads.lock().unwrap();
        let thread = threads
            .get(session_id)
            .ok_or_else(|| ForgeError::remote(Some(404), "no such thread"))?;
        Ok(vec![
            RemoteMessage::new(MessageRole::User, thread.prompt.clone()),
            RemoteMessage::new(MessageRole::Assistant, thread.response.clone().unwrap_or_default()),
        ])
    }

    async fn cancel_run(&self, _run_id: &str, _session_id: &str) -> Result<()> {
        Ok(())
    }
}

fn jobs(service: Arc<StubService>) -> ReasoningJobClient {
    ReasoningJobClient::new(service)
        .with_policy(PollPolicy::fixed(Duration::from_millis(100), Duration::from_secs(60)))
}

fn prompts() -> Arc<PromptBuilder> {
    Arc::new(PromptBuilder::new().unwrap())
}

fn classifier(service: Arc<StubService>) -> ContentClassifierService {
    ContentClassifierService::new(jobs(service), prompts(), "asst_classifier", "test-model")
}

fn post(id: &str, title: &str) -> SourcePost {
    SourcePost {
        id: id.to_string(),
        title: title.to_string(),
        body: format!("Body of {title}"),
        source: Some("reddit".to_string()),
        url: None,
    }
}

fn landing_spec() -> LandingPageSpec {
    serde_json::from_value(serde_json::json!({
        "title": "Shiftly",
        "description": "Shift swaps without the group chat"
    }))
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn classify_fenced_json() {
    let service = StubService::replying(
        "Sure!\n```json\n{\"isPainPoint\":true,\"reason\":\"x\",\"confidence\":0.8}\n```",
    );
    let result = classifier(service.clone())
        .classify_content("Invoices", "Reconciling by hand", &CancellationToken::new())
        .await;

    assert!(result.is_pain_point);
    assert_eq!(result.confidence, 0.8);
    assert!(!result.parsed_from_fallback);
    assert!(!result.error);
    assert_eq!(result.metadata.model, "test-model");
    // two in_progress checks, then completed
    assert_eq!(service.status_checks.load(Ordering::SeqCst), 3);
    assert!(service.prompts()[0].contains("Title: Invoices"));
}

#[tokio::test(start_paused = true)]
async fn classify_heuristic_prose() {
    let service = StubService::replying("isPainPoint: yes because users are frustrated");
    let result = classifier(service)
        .classify_content("t", "b", &CancellationToken::new())
        .await;

    assert!(result.is_pain_point);
    assert!(result.parsed_from_fallback);
    assert_eq!(result.confidence, 0.7);
}

#[tokio::test(start_paused = true)]
async fn classify_empty_response_fails_open() {
    let service = StubService::replying("");
    let result = classifier(service)
        .classify_content("t", "b", &CancellationToken::new())
        .await;

    assert!(!result.is_pain_point);
    assert!(result.error);
    assert_eq!(result.confidence, 0.0);
    assert!(result.reason.contains("empty response"));
}

#[tokio::test(start_paused = true)]
async fn classify_failed_run_fails_open() {
    let service = StubService::replying(FAIL_RUN);
    let result = classifier(service)
        .classify_content("t", "b", &CancellationToken::new())
        .await;

    assert!(result.error);
    assert!(result.reason.contains("failed"));
}

#[tokio::test(start_paused = true)]
async fn classify_cancelled_fails_open() {
    let service = StubService::replying("{\"isPainPoint\": true}");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = classifier(service).classify_content("t", "b", &cancel).await;
    assert!(result.error);
    assert!(!result.is_pain_point);
}

#[tokio::test(start_paused = true)]
async fn classify_batch_keeps_order_and_survives_failures() {
    let service = StubService::new(|prompt| {
        if prompt.contains("Title: broken") {
            String::new()
        } else if prompt.contains("Title: pain") {
            r#"{"isPainPoint": true, "reason": "real problem", "confidence": 0.9}"#.to_string()
        } else {
            r#"{"isPainPoint": false, "reason": "chatter", "confidence": 0.6}"#.to_string()
        }
    });
    let posts = vec![post("a", "pain"), post("b", "broken"), post("c", "chatter"), post("d", "pain")];

    let results = classifier(service)
        .with_concurrency(2)
        .classify_batch(&posts, &CancellationToken::new())
        .await;

    let ids: Vec<&str> = results.iter().map(|r| r.post_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
    assert!(results[0].result.is_pain_point);
    assert!(results[1].result.error);
    assert!(!results[2].result.is_pain_point && !results[2].result.error);
    assert!(results[3].result.is_pain_point);
}

#[tokio::test(start_paused = true)]
async fn generate_code_artifact() {
    let service = StubService::replying(
        "import React from 'react';\n\nconst Landing = () => (\n  <main className=\"p-8\">Shiftly</main>\n);",
    );
    let generator = ArtifactGenerationService::new(jobs(service.clone()), prompts(), "asst_generator");

    let result = generator
        .generate_artifact(&landing_spec(), &CancellationToken::new())
        .await
        .unwrap();

    let code = result.react_code().unwrap();
    assert!(!code.is_empty());
    assert!(code.contains("export default"));
    assert!(result.dependencies.contains_key("react-dom"));
    assert!(service.prompts()[0].contains("Product: Shiftly"));
}

#[tokio::test(start_paused = true)]
async fn generate_structured_artifact() {
    let service = StubService::replying(
        r#"{"hero": {"headline": "Swap shifts in seconds"}, "metaTags": {"title": "Shiftly", "description": "Swaps", "keywords": ["shifts"]}}"#,
    );
    let generator = ArtifactGenerationService::new(jobs(service), prompts(), "asst_generator");

    let result = generator
        .generate_artifact(&landing_spec(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(result.artifact, Artifact::Structured { .. }));
    assert_eq!(result.meta_tags.title, "Shiftly");
    assert_eq!(result.meta_tags.keywords, vec!["shifts"]);
}

#[tokio::test(start_paused = true)]
async fn generate_propagates_errors_with_context() {
    let generator = ArtifactGenerationService::new(jobs(StubService::replying("  ")), prompts(), "asst_generator");
    let err = generator
        .generate_artifact(&landing_spec(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ForgeError::Generation { .. }));
    assert!(err.root_cause().is_response_parse());

    let generator = ArtifactGenerationService::new(jobs(StubService::replying(FAIL_RUN)), prompts(), "asst_generator");
    let err = generator
        .generate_artifact(&landing_spec(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.root_cause().is_remote_terminal());
    assert!(err.to_string().contains("Shiftly"));
}

#[tokio::test(start_paused = true)]
async fn research_extracts_then_generates() {
    let service = StubService::new(|prompt| {
        if prompt.contains("market research analyst") {
            "```json\n{\"painPoints\": [{\"title\": \"Shift swaps are chaos\", \"description\": \"Group chats lose requests\", \"severity\": \"high\", \"frequency\": 2, \"sourcePostIds\": [\"a\", \"b\"]}]}\n```".to_string()
        } else {
            r#"{"ideas": [{"title": "Shiftly", "description": "Swap marketplace", "relatedPainPointTitle": "Shift swaps are chaos", "keyFeatures": ["swaps", "approvals"]}]}"#.to_string()
        }
    });
    let research = IdeaResearchService::new(jobs(service), prompts(), "asst_classifier", "asst_generator");
    let cancel = CancellationToken::new();

    let pain_points = research
        .extract_pain_points(&[post("a", "swaps"), post("b", "more swaps")], &cancel)
        .await
        .unwrap();
    assert_eq!(pain_points.len(), 1);
    assert_eq!(pain_points[0].source_post_ids, vec!["a", "b"]);

    let ideas = research.generate_ideas(&pain_points, &cancel).await.unwrap();
    assert_eq!(ideas.len(), 1);
    assert_eq!(ideas[0].related_pain_point_title, pain_points[0].title);
}

#[tokio::test(start_paused = true)]
async fn research_rejects_unstructured_output() {
    let service = StubService::replying("I found several pain points, mostly about scheduling.");
    let research = IdeaResearchService::new(jobs(service), prompts(), "asst_classifier", "asst_generator");

    let err = research
        .extract_pain_points(&[post("a", "swaps")], &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_response_parse());
}

#[tokio::test(start_paused = true)]
async fn research_skips_jobs_for_empty_input() {
    let service = StubService::replying("unused");
    let research = IdeaResearchService::new(jobs(service.clone()), prompts(), "asst_classifier", "asst_generator");
    let cancel = CancellationToken::new();

    assert!(research.extract_pain_points(&[], &cancel).await.unwrap().is_empty());
    let none: &[PainPoint] = &[];
    assert!(research.generate_ideas(none, &cancel).await.unwrap().is_empty());
    assert_eq!(service.next_id.load(Ordering::SeqCst), 0);
}

#[test]
fn app_requires_credentials() {
    let Err(err) = ForgeApp::build(&ForgeConfig::default()) else {
        panic!("empty configuration must not build");
    };
    assert!(err.is_configuration());
    let message = err.to_string();
    assert!(message.contains("IDEAFORGE_API_KEY"));
    assert!(message.contains("IDEAFORGE_CLASSIFIER_AGENT_ID"));
    assert!(message.contains("IDEAFORGE_GENERATOR_AGENT_ID"));
}

#[tokio::test(start_paused = true)]
async fn app_wires_services_and_shuts_down() {
    let config = ForgeConfig {
        api_key: Some("sk-test".to_string()),
        classifier_agent_id: Some("asst_classifier".to_string()),
        generator_agent_id: Some("asst_generator".to_string()),
        ..Default::default()
    }
    .validate()
    .unwrap();

    let service = StubService::replying(r#"{"isPainPoint": false, "reason": "meh"}"#);
    let mut app = ForgeApp::with_service(config, service).unwrap();
    app.start_session_sweeper().unwrap();

    let result = app
        .classifier
        .classify_content("t", "b", &app.cancellation_token())
        .await;
    assert!(!result.is_pain_point);
    assert!(!result.error);
    assert_eq!(result.metadata.model, app.config().model_label);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sweeper_refuses_unusable_session_settings() {
    let valid = ForgeConfig {
        api_key: Some("sk-test".to_string()),
        classifier_agent_id: Some("asst_classifier".to_string()),
        generator_agent_id: Some("asst_generator".to_string()),
        ..Default::default()
    }
    .validate()
    .unwrap();

    let mut zero_interval = valid.clone();
    zero_interval.sessions.sweep_interval_secs = 0;
    let mut huge_idle = valid;
    huge_idle.sessions.max_idle_hours = i64::MAX;

    for config in [zero_interval, huge_idle] {
        let mut app = ForgeApp::with_service(config, StubService::replying("")).unwrap();
        let err = app.start_session_sweeper().unwrap_err();
        assert!(err.is_configuration());
        app.shutdown().await;
    }
}
