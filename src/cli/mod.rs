use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::wire::{AppType, GenerationRequest, Preferences, Requirements};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    Anthropic,
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "flutterhub", version, about = "Generate Flutter projects from natural-language app descriptions")]
pub struct Args {
    /// TOML file overlaid on the built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Directory holding `.flutterhub/` (stored keys, saved artifacts).
    #[arg(long, global = true)]
    pub root: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service used by the web UI.
    Serve(ServeArgs),
    /// Generate one project and optionally write it to disk.
    Generate(GenerateArgs),
    /// Manage locally stored provider API keys.
    Keys {
        #[command(subcommand)]
        action: KeysCommand,
    },
}

#[derive(ClapArgs, Debug)]
pub struct ServeArgs {
    #[arg(long)]
    pub addr: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(ClapArgs, Debug)]
pub struct GenerateArgs {
    /// What the app should do, in any language.
    pub description: String,

    #[arg(long, default_value = "general")]
    pub app_type: String,

    #[arg(long = "platform")]
    pub platforms: Vec<String>,

    #[arg(long = "feature")]
    pub features: Vec<String>,

    #[arg(long)]
    pub complexity: Option<String>,

    #[arg(long)]
    pub state_management: Option<String>,

    #[arg(long)]
    pub architecture: Option<String>,

    #[arg(long, default_value_t = false)]
    pub testing: bool,

    /// Write the generated files under this directory.
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Keep request, raw completion and project JSON under `.flutterhub/tx/<id>/`.
    #[arg(long, default_value_t = false)]
    pub save_artifacts: bool,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// One completion attempt, no backoff.
    #[arg(long, default_value_t = false)]
    pub no_retry: bool,

    /// Print the response JSON instead of the dashboard.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl GenerateArgs {
    pub fn to_request(&self) -> GenerationRequest {
        let mut requirements = Requirements::default();
        if !self.platforms.is_empty() {
            requirements.platforms = self.platforms.clone();
        }
        if !self.features.is_empty() {
            requirements.features = self.features.clone();
        }
        if let Some(c) = &self.complexity {
            requirements.complexity = c.clone();
        }

        let mut preferences = Preferences { testing: self.testing, ..Preferences::default() };
        if let Some(s) = &self.state_management {
            preferences.state_management = s.clone();
        }
        if let Some(a) = &self.architecture {
            preferences.architecture = a.clone();
        }

        GenerationRequest {
            description: self.description.clone(),
            app_type: AppType::parse(&self.app_type),
            requirements,
            preferences,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    Add {
        #[arg(value_enum)]
        provider: ProviderKind,
        key: String,
    },
    List,
    Remove {
        id: Uuid,
    },
}
