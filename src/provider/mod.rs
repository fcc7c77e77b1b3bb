use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::CompletionError;
use crate::wire::{ChatMessage, Usage};

pub mod openai;

/// One call's worth of input for the completion service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<Usage>,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Exactly one outbound call; retrying is the caller's business.
    async fn complete(&self, req: &CompletionRequest) -> Result<Completion, CompletionError>;
}

pub type DynProvider = Arc<dyn CompletionProvider>;

pub fn make_provider(api_base: &str, api_key: Option<String>) -> Result<DynProvider, CompletionError> {
    Ok(Arc::new(openai::OpenAIProvider::new(api_base, api_key)?))
}

/// Map a non-2xx status (and its body) to the typed error the UI understands.
pub fn classify_status(status: u16, body: &str) -> CompletionError {
    match status {
        401 => CompletionError::InvalidCredential,
        429 => CompletionError::RateLimited,
        s if s >= 500 => CompletionError::ServerError(s),
        s => CompletionError::Http { status: s, message: error_message(body) },
    }
}

/// `error.message` from an OpenAI-style error body, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
