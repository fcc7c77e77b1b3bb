use tracing::info;

use crate::config::CompletionSettings;
use crate::errors::GenerationError;
use crate::prompt;
use crate::provider::{CompletionRequest, DynProvider};
use crate::retry::RetryPolicy;
use crate::wire::{ChatMessage, ChatReply, ChatRequest};

/// General assistant behind `/api/chat`.
pub struct Assistant {
    provider: DynProvider,
    settings: CompletionSettings,
    retry: RetryPolicy,
}

impl Assistant {
    pub fn new(provider: DynProvider, settings: CompletionSettings, retry: RetryPolicy) -> Self {
        Self { provider, settings, retry }
    }

    pub async fn reply(&self, req: &ChatRequest) -> Result<ChatReply, GenerationError> {
        if req.messages.is_empty() {
            return Err(GenerationError::BadRequest("Messages must be a non-empty list.".into()));
        }

        let model = req
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(self.settings.model.as_str())
            .to_string();

        let mut messages = Vec::with_capacity(req.messages.len() + 1);
        messages.push(ChatMessage::system(prompt::assistant_system_prompt()));
        messages.extend(req.messages.iter().cloned());

        let call = CompletionRequest {
            model,
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            timeout: self.settings.timeout(),
        };
        info!(model = %call.model, messages = req.messages.len(), "chat request");

        let completion = self.retry.run("chat call", || self.provider.complete(&call)).await?;
        Ok(ChatReply { content: completion.content })
    }
}
