use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cli::ProviderKind;
use crate::provider::openai::DEFAULT_API_BASE;
use crate::retry::RetryPolicy;
use crate::settings::ApiKeyStore;
use crate::validate::ValidationRules;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Knobs for one kind of completion call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionSettings {
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl CompletionSettings {
    pub fn generation() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            model: "gpt-4o-mini".into(),
            max_tokens: 4_000,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }

    pub fn chat() -> Self {
        Self { max_tokens: 1_000, temperature: 0.7, timeout_secs: 30, ..Self::generation() }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self::generation()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { addr: "127.0.0.1:8787".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub root: String,
    pub completion: CompletionSettings,
    pub chat: CompletionSettings,
    pub retry: RetryPolicy,
    pub validation: ValidationRules,
    pub server: ServerSettings,
    /// Key store path, relative to `root` unless absolute.
    pub settings_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: ".".into(),
            completion: CompletionSettings::generation(),
            chat: CompletionSettings::chat(),
            retry: RetryPolicy::default(),
            validation: ValidationRules::default(),
            server: ServerSettings::default(),
            settings_file: ".flutterhub/keys.json".into(),
        }
    }
}

impl Config {
    /// Defaults, overlaid by the TOML file when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)?;
        let overlay: toml::Value =
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        // Merge onto serialized defaults so a partial [chat] keeps chat defaults.
        let mut merged = toml::Value::try_from(Self::default())?;
        merge(&mut merged, overlay);
        let cfg: Config = merged
            .try_into()
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn settings_path(&self) -> PathBuf {
        let p = Path::new(&self.settings_file);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            Path::new(&self.root).join(p)
        }
    }

    /// `OPENAI_API_KEY`, else the newest stored openai key. Never read from the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_api_key_from(std::env::var(API_KEY_ENV).ok(), &self.settings_path())
    }
}

fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (k, v) in overlay {
                match base.get_mut(&k) {
                    Some(existing) => merge(existing, v),
                    None => {
                        base.insert(k, v);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn resolve_api_key_from(env_value: Option<String>, store_path: &Path) -> Option<String> {
    if let Some(k) = env_value.filter(|k| !k.trim().is_empty()) {
        return Some(k);
    }
    match ApiKeyStore::load(store_path) {
        Ok(store) => store.latest_for(ProviderKind::OpenAI).map(|k| k.key.clone()),
        Err(e) => {
            warn!("ignoring unreadable key store: {e:#}");
            None
        }
    }
}
