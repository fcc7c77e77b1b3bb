use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{classify_status, Completion, CompletionProvider, CompletionRequest};
use crate::errors::CompletionError;
use crate::wire::{ChatMessage, Usage};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat completions client.
pub struct OpenAIProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

impl OpenAIProvider {
    pub fn new(api_base: &str, api_key: Option<String>) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .user_agent(concat!("flutterhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn complete(&self, req: &CompletionRequest) -> Result<Completion, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingCredential)?;
        let timeout_secs = req.timeout.as_secs();

        let body = ChatBody {
            model: &req.model,
            messages: &req.messages,
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        };

        debug!(model = %req.model, messages = req.messages.len(), max_tokens = req.max_tokens, "POST {}", self.endpoint);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .timeout(req.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout_secs))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| map_reqwest_error(e, timeout_secs))?;
        debug!(status = status.as_u16(), bytes = text.len(), "completion response");

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &text));
        }
        parse_body(&text)
    }
}

fn map_reqwest_error(e: reqwest::Error, timeout_secs: u64) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout(timeout_secs)
    } else {
        CompletionError::Transport(e.to_string())
    }
}

/// First choice's message content plus the usage block, if any.
pub fn parse_body(text: &str) -> Result<Completion, CompletionError> {
    let parsed: ChatResponse =
        serde_json::from_str(text).map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CompletionError::MalformedResponse("no choices[0].message.content".into()))?;
    Ok(Completion { content, usage: parsed.usage })
}
