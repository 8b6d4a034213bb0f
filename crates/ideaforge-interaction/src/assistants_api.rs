//! AssistantsApiService - REST client for an assistants-style threads/runs API.
//!
//! Maps the reasoning service contract onto:
//! - `POST /threads`
//! - `POST /threads/{thread}/messages`
//! - `POST /threads/{thread}/runs`
//! - `GET  /threads/{thread}/runs/{run}`
//! - `GET  /threads/{thread}/messages?order=asc`
//! - `POST /threads/{thread}/runs/{run}/cancel`
//!
//! Transport retries belong to an outer layer; every call here is attempted
//! exactly once.

use std::time::Duration;

use async_trait::async_trait;
use ideaforge_core::config::ValidatedConfig;
use ideaforge_core::reasoning::{ReasoningService, RemoteMessage, RunStatus};
use ideaforge_core::session::MessageRole;
use ideaforge_core::{ForgeError, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MESSAGE_PAGE_LIMIT: u32 = 100;

/// [`ReasoningService`] implementation that talks HTTP.
#[derive(Clone)]
pub struct AssistantsApiService {
    client: Client,
    api_key: String,
    base_url: String,
    request_timeout: Duration,
}

impl AssistantsApiService {
    /// Creates a client for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Creates a client from validated startup configuration.
    pub fn from_config(config: &ValidatedConfig) -> Self {
        Self::new(config.api_key.clone(), config.base_url.clone())
    }

    /// Overrides the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER, BETA_VALUE)
            .timeout(self.request_timeout)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorized(self.client.post(self.url(path))).json(body);
        self.send(request).await
    }

    async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.authorized(self.client.get(self.url(path)));
        self.send(request).await
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await.map_err(|err| {
            ForgeError::remote(None, format!("Reasoning API request failed: {err}"))
        })?;

        let response = ensure_success(response).await?;

        response.json().await.map_err(|err| {
            ForgeError::remote(None, format!("Failed to parse reasoning API response: {err}"))
        })
    }
}

#[async_trait]
impl ReasoningService for AssistantsApiService {
    async fn create_session(&self, system_context: Option<&str>) -> Result<String> {
        let messages = system_context
            .map(|context| {
                vec![MessageRequest {
                    role: "user",
                    content: context,
                }]
            })
            .unwrap_or_default();

        let thread: IdResponse = self
            .post_json("threads", &CreateThreadRequest { messages })
            .await?;
        tracing::debug!("Created remote thread {}", thread.id);
        Ok(thread.id)
    }

    async fn post_message(&self, session_id: &str, role: MessageRole, text: &str) -> Result<()> {
        let role = wire_role(role)?;
        let _: IdResponse = self
            .post_json(
                &format!("threads/{session_id}/messages"),
                &MessageRequest {
                    role,
                    content: text,
                },
            )
            .await?;
        Ok(())
    }

    async fn create_run(&self, session_id: &str, agent_id: &str) -> Result<String> {
        let run: IdResponse = self
            .post_json(
                &format!("threads/{session_id}/runs"),
                &CreateRunRequest {
                    assistant_id: agent_id,
                },
            )
            .await?;
        Ok(run.id)
    }

    async fn get_run_status(&self, run_id: &str, session_id: &str) -> Result<RunStatus> {
        let run: RunResponse = self
            .get_json(&format!("threads/{session_id}/runs/{run_id}"))
            .await?;
        Ok(run.status)
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<RemoteMessage>> {
        let list: MessageListResponse = self
            .get_json(&format!(
                "threads/{session_id}/messages?order=asc&limit={MESSAGE_PAGE_LIMIT}"
            ))
            .await?;
        Ok(list.data.into_iter().map(into_remote_message).collect())
    }

    async fn cancel_run(&self, run_id: &str, session_id: &str) -> Result<()> {
        let _: RunResponse = self
            .post_json(
                &format!("threads/{session_id}/runs/{run_id}/cancel"),
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct CreateThreadRequest<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<MessageRequest<'a>>,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Deserialize)]
struct RunResponse {
    status: RunStatus,
}

#[derive(Deserialize)]
struct MessageListResponse {
    data: Vec<MessageObject>,
}

#[derive(Deserialize)]
struct MessageObject {
    role: MessageRole,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// The threads API only accepts user and assistant messages.
fn wire_role(role: MessageRole) -> Result<&'static str> {
    match role {
        MessageRole::User => Ok("user"),
        MessageRole::Assistant => Ok("assistant"),
        MessageRole::System => Err(ForgeError::remote(
            None,
            "system messages cannot be posted to a thread",
        )),
    }
}

fn into_remote_message(message: MessageObject) -> RemoteMessage {
    let content = message
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.value),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");
    RemoteMessage::new(message.role, content)
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read reasoning API error body".to_string());
    Err(map_http_error(status, body))
}

fn map_http_error(status: StatusCode, body: String) -> ForgeError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    ForgeError::remote(Some(status.as_u16()), message)
}
