use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// ========================================
/// App generation request/response shapes
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    Productivity,
    Ecommerce,
    Social,
    Fitness,
    Education,
    Entertainment,
    #[default]
    #[serde(other)]
    General,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Productivity => "productivity",
            AppType::Ecommerce => "ecommerce",
            AppType::Social => "social",
            AppType::Fitness => "fitness",
            AppType::Education => "education",
            AppType::Entertainment => "entertainment",
            AppType::General => "general",
        }
    }

    /// Lenient parse used by the CLI; unknown names map to `General`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "productivity" => AppType::Productivity,
            "ecommerce" | "e-commerce" => AppType::Ecommerce,
            "social" => AppType::Social,
            "fitness" => AppType::Fitness,
            "education" => AppType::Education,
            "entertainment" => AppType::Entertainment,
            _ => AppType::General,
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Requirements {
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    #[serde(default = "default_features")]
    pub features: Vec<String>,
    #[serde(default = "default_complexity")]
    pub complexity: String,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            features: default_features(),
            complexity: default_complexity(),
        }
    }
}

fn default_platforms() -> Vec<String> {
    vec!["Android".into(), "iOS".into()]
}

fn default_features() -> Vec<String> {
    vec!["Modern UI".into(), "Responsive design".into()]
}

fn default_complexity() -> String {
    "medium".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default = "default_state_management")]
    pub state_management: String,
    #[serde(default = "default_architecture")]
    pub architecture: String,
    #[serde(default)]
    pub testing: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            state_management: default_state_management(),
            architecture: default_architecture(),
            testing: false,
        }
    }
}

fn default_state_management() -> String {
    "Provider".into()
}

fn default_architecture() -> String {
    "Clean Architecture".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub app_type: AppType,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub preferences: Preferences,
}

/// A generated Flutter project as returned to the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedProject {
    pub name: String,
    pub description: String,
    pub app_type: AppType,
    /// Relative path -> file text. Sorted map so responses are stable.
    pub files: BTreeMap<String, String>,
    pub dependencies: Vec<String>,
    pub patterns: Vec<String>,
    pub quality_score: u8,
}

impl GeneratedProject {
    pub fn total_bytes(&self) -> usize {
        self.files.values().map(|c| c.len()).sum()
    }
}

/// Token accounting reported by the completion service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum GenerateResponse {
    Success {
        success: bool,
        project: GeneratedProject,
        usage: Option<Usage>,
    },
    Failure {
        success: bool,
        error: String,
        project: GeneratedProject,
    },
}

impl GenerateResponse {
    pub fn success(project: GeneratedProject, usage: Option<Usage>) -> Self {
        GenerateResponse::Success { success: true, project, usage }
    }

    pub fn failure(error: String, project: GeneratedProject) -> Self {
        GenerateResponse::Failure { success: false, error, project }
    }
}

/// ========================================
/// Chat completion wire protocol
/// ========================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}
