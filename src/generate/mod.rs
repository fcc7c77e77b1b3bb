use tracing::{debug, info, warn};

use crate::config::CompletionSettings;
use crate::errors::{ContentError, GenerationError};
use crate::extract;
use crate::fallback;
use crate::prompt;
use crate::provider::{CompletionRequest, DynProvider};
use crate::retry::RetryPolicy;
use crate::score;
use crate::validate::{self, ValidationRules};
use crate::wire::{ChatMessage, GenerateResponse, GeneratedProject, GenerationRequest, Usage};

pub const PROJECT_PATTERNS: [&str; 3] = ["Clean Architecture", "MVVM", "Repository Pattern"];

/// Everything one generation run produced, successful or not.
#[derive(Debug)]
pub struct Outcome {
    pub project: GeneratedProject,
    pub usage: Option<Usage>,
    /// The completion text, when the service answered.
    pub raw: Option<String>,
    pub warnings: Vec<String>,
    pub error: Option<GenerationError>,
}

impl Outcome {
    fn failed(req: &GenerationRequest, error: GenerationError, raw: Option<String>, usage: Option<Usage>) -> Self {
        warn!(error = %error, "substituting fallback project");
        Self {
            project: fallback::project(&req.description, req.app_type),
            usage,
            raw,
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    pub fn http_status(&self) -> u16 {
        self.error.as_ref().map_or(200, GenerationError::http_status)
    }

    pub fn response(&self) -> GenerateResponse {
        match &self.error {
            None => GenerateResponse::success(self.project.clone(), self.usage.clone()),
            Some(e) => GenerateResponse::failure(e.user_message(), self.project.clone()),
        }
    }
}

/// Result of parsing plus validating one completion.
#[derive(Debug)]
pub struct Built {
    pub project: GeneratedProject,
    pub warnings: Vec<String>,
}

/// Raw completion -> validated project. Pure; no network.
pub fn build_project(raw: &str, req: &GenerationRequest, rules: &ValidationRules) -> Result<Built, ContentError> {
    validate::check_prose(raw, rules)?;

    let parsed = extract::parse(raw);
    for w in &parsed.warnings {
        debug!("parse: {w}");
    }
    if !parsed.synthesized.is_empty() {
        debug!(synthesized = ?parsed.synthesized, mode = ?parsed.mode, "filled default files");
    }
    validate::check_structure(&parsed.produced(), rules)?;

    let dependencies = parsed
        .files
        .get(extract::MANIFEST_PATH)
        .map(|m| extract::dependencies(m))
        .unwrap_or_default();
    let quality_score = score::quality_score(&parsed.files, &dependencies);

    Ok(Built {
        project: GeneratedProject {
            name: extract::project_name(&req.description),
            description: req.description.clone(),
            app_type: req.app_type,
            files: parsed.files,
            dependencies,
            patterns: PROJECT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            quality_score,
        },
        warnings: parsed.warnings,
    })
}

pub struct Generator {
    provider: DynProvider,
    settings: CompletionSettings,
    retry: RetryPolicy,
    rules: ValidationRules,
}

impl Generator {
    pub fn new(provider: DynProvider, settings: CompletionSettings, retry: RetryPolicy, rules: ValidationRules) -> Self {
        Self { provider, settings, retry, rules }
    }

    pub fn completion_request(&self, req: &GenerationRequest) -> CompletionRequest {
        let (system, user) = prompt::compose(req);
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            timeout: self.settings.timeout(),
        }
    }

    /// Never fails: every error path carries the fallback project.
    pub async fn generate(&self, req: &GenerationRequest) -> Outcome {
        if req.description.trim().is_empty() {
            return Outcome::failed(
                req,
                GenerationError::BadRequest("The app description must not be empty.".into()),
                None,
                None,
            );
        }

        info!(app_type = %req.app_type, chars = req.description.chars().count(), "generating project");
        let call = self.completion_request(req);
        let completion = match self
            .retry
            .run("completion call", || self.provider.complete(&call))
            .await
        {
            Ok(c) => c,
            Err(e) => return Outcome::failed(req, e.into(), None, None),
        };

        match build_project(&completion.content, req, &self.rules) {
            Ok(built) => {
                info!(
                    files = built.project.files.len(),
                    score = built.project.quality_score,
                    "project generated"
                );
                Outcome {
                    project: built.project,
                    usage: completion.usage,
                    raw: Some(completion.content),
                    warnings: built.warnings,
                    error: None,
                }
            }
            Err(e) => Outcome::failed(req, e.into(), Some(completion.content), completion.usage),
        }
    }
}
