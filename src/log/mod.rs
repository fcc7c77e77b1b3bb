use anyhow::Result;
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--debug`.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

pub fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join(".flutterhub").join("tx").join(tx.to_string())
}

/// Files written for one generation run.
#[derive(Debug, Default)]
pub struct SavedPaths {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

impl SavedPaths {
    pub fn new(root: &Path, tx: Uuid) -> Self {
        Self { dir: tx_dir(root, tx), files: Vec::new() }
    }

    /// `{stage}.json`, pretty printed.
    pub fn save_stage<T: Serialize>(&mut self, stage: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let p = self.dir.join(format!("{stage}.json"));
        fs::write(&p, to_string_pretty(value)?)?;
        self.files.push(p);
        Ok(())
    }

    /// Raw text such as the completion body, stored as-is.
    pub fn save_text(&mut self, name: &str, text: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let p = self.dir.join(name);
        fs::write(&p, text)?;
        self.files.push(p);
        Ok(())
    }
}

fn render_saved_paths(saved: &SavedPaths) -> String {
    let mut out = format!("artifacts directory: {}\n", saved.dir.display());
    for p in &saved.files {
        out.push_str(&format!("  saved: {}\n", p.display()));
    }
    out
}

/// Written to stderr; stdout is reserved for `--json` output.
pub fn print_saved_paths(saved: &SavedPaths) {
    eprint!("{}", render_saved_paths(saved));
}
