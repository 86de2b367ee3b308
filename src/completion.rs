//! Chat completion client
//!
//! The conversation store talks to the AI provider through [`CompletionClient`].
//! [`OpenAiClient`] implements it against an OpenAI-compatible
//! `/chat/completions` endpoint using a long-lived reqwest::Client for connection pooling.

use crate::conversation::Exchange;
use crate::error::CompletionError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Result of a single completion call
#[derive(Debug)]
pub enum CompletionOutcome {
    Reply(String),
    Failed(CompletionError),
}

impl From<Result<String, CompletionError>> for CompletionOutcome {
    fn from(result: Result<String, CompletionError>) -> Self {
        match result {
            Ok(reply) => CompletionOutcome::Reply(reply),
            Err(cause) => CompletionOutcome::Failed(cause),
        }
    }
}

/// Performs the network call to the AI provider.
///
/// Implementations receive the conversation in order (`system` first) and
/// must not retain it.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, exchanges: &[Exchange]) -> CompletionOutcome;
}

/// Reusable OpenAI-compatible client (connection-pooled)
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, base_url: &str, model: &str) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build pooled HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn request(&self, exchanges: &[Exchange]) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::NotConfigured)?;

        let request = ChatRequest::new(&self.model, exchanges);

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            "Calling completion API"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let reply = parse_reply(&body)?;

        info!(chars = reply.len(), "Completion reply received");

        Ok(reply)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, exchanges: &[Exchange]) -> CompletionOutcome {
        self.request(exchanges).await.into()
    }
}

/// Extract the first choice's text from a `/chat/completions` response body
fn parse_reply(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Malformed(e.to_string()))?;

    let reply = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    if reply.is_empty() {
        return Err(CompletionError::EmptyReply);
    }

    Ok(reply)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, exchanges: &'a [Exchange]) -> Self {
        Self {
            model,
            messages: exchanges
                .iter()
                .map(|e| ChatMessage {
                    role: e.role().as_str(),
                    content: e.content(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}
