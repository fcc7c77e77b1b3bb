use thiserror::Error;

/// Failures of a single call to the completion service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("missing api key: OPENAI_API_KEY is not set and no stored key was found")]
    MissingCredential,
    #[error("network error: {0}")]
    Transport(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("invalid api key")]
    InvalidCredential,
    #[error("rate limited")]
    RateLimited,
    #[error("upstream server error (http {0})")]
    ServerError(u16),
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Transient failures a caller may retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::RateLimited | Self::ServerError(_)
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => {
                "The completion service API key is not configured. Check the server settings.".into()
            }
            Self::Transport(_) => {
                "Could not reach the AI service. Check your internet connection.".into()
            }
            Self::Timeout(_) => "The AI service took too long to answer. Please try again.".into(),
            Self::InvalidCredential => "The completion service API key is invalid.".into(),
            Self::RateLimited => "Usage limit reached. Please try again later.".into(),
            Self::ServerError(_) => "The AI service is having problems. Please try again later.".into(),
            Self::Http { message, .. } => format!("The AI service rejected the request: {message}"),
            Self::MalformedResponse(_) => "The AI service returned an unexpected response.".into(),
        }
    }
}

/// Rejections raised by the content validator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    #[error("generated instructions instead of code")]
    InstructionsInsteadOfCode,
    #[error("insufficient Flutter code structure: {}", .missing.join(", "))]
    InsufficientStructure { missing: Vec<String> },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl GenerationError {
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Completion(e) => e.user_message(),
            Self::Content(ContentError::InstructionsInsteadOfCode) => {
                "The AI returned instructions instead of code; a starter project was generated instead.".into()
            }
            Self::Content(ContentError::InsufficientStructure { .. }) => {
                "The generated code was incomplete; a starter project was generated instead.".into()
            }
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Completion(e) => match e {
                CompletionError::MissingCredential => 500,
                CompletionError::Transport(_) => 503,
                CompletionError::Timeout(_) => 408,
                CompletionError::InvalidCredential => 401,
                CompletionError::RateLimited => 429,
                CompletionError::ServerError(_)
                | CompletionError::Http { .. }
                | CompletionError::MalformedResponse(_) => 502,
            },
            Self::Content(_) => 422,
        }
    }
}
