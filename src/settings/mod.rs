use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::cli::ProviderKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredKey {
    pub id: Uuid,
    pub provider: ProviderKind,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

impl StoredKey {
    /// `sk-p…wxyz` style rendering for listings.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.key.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

/// API keys saved from the settings dialog, one JSON array on disk.
#[derive(Debug)]
pub struct ApiKeyStore {
    path: PathBuf,
    keys: Vec<StoredKey>,
}

impl ApiKeyStore {
    /// Missing file means an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let keys = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&raw).with_context(|| format!("parsing key store {}", path.display()))?
            }
        } else {
            Vec::new()
        };
        Ok(Self { path, keys })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[StoredKey] {
        &self.keys
    }

    pub fn add(&mut self, provider: ProviderKind, key: &str) -> Result<StoredKey> {
        let key = key.trim();
        anyhow::ensure!(!key.is_empty(), "refusing to store an empty key");
        let entry = StoredKey { id: Uuid::new_v4(), provider, key: key.to_string(), created_at: Utc::now() };
        self.keys.push(entry.clone());
        self.save()?;
        Ok(entry)
    }

    /// Returns whether a key with that id existed.
    pub fn remove(&mut self, id: Uuid) -> Result<bool> {
        let before = self.keys.len();
        self.keys.retain(|k| k.id != id);
        let removed = self.keys.len() != before;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Most recently created key for a provider.
    pub fn latest_for(&self, provider: ProviderKind) -> Option<&StoredKey> {
        self.keys.iter().filter(|k| k.provider == provider).max_by_key(|k| k.created_at)
    }

    fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(serde_json::to_string_pretty(&self.keys)?.as_bytes())?;
        tmp.persist(&self.path)
            .with_context(|| format!("writing key store {}", self.path.display()))?;
        Ok(())
    }
}
