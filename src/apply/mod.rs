use anyhow::{anyhow, Context, Result};
use fs_err as fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::safety;
use crate::wire::GeneratedProject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Created,
    Updated,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct FileResult {
    pub kind: WriteKind,
    pub rel: String,
    pub path: Option<PathBuf>,
    pub bytes_before: Option<u64>,
    pub bytes_after: u64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub bytes_written: u64,
    pub details: Vec<FileResult>,
}

/// Write every project file under `root`. Unsafe paths are skipped, never written.
pub fn write_project(root: &Path, project: &GeneratedProject, dry: bool) -> Result<ApplySummary> {
    let mut sum = ApplySummary::default();

    for (rel, content) in &project.files {
        let after = content.len() as u64;
        let Some(abs) = safety::resolve_within(root, rel) else {
            sum.skipped += 1;
            sum.details.push(FileResult {
                kind: WriteKind::Skipped,
                rel: rel.clone(),
                path: None,
                bytes_before: None,
                bytes_after: 0,
                note: Some("path escapes the output directory".into()),
            });
            continue;
        };

        let before = if abs.exists() { Some(abs.metadata()?.len()) } else { None };
        if !dry {
            write_atomic(&abs, content).with_context(|| format!("writing {}", abs.display()))?;
        }

        let kind = if before.is_none() { WriteKind::Created } else { WriteKind::Updated };
        match kind {
            WriteKind::Created => sum.created += 1,
            _ => sum.updated += 1,
        }
        sum.bytes_written += after;
        sum.details.push(FileResult {
            kind,
            rel: rel.clone(),
            path: Some(abs),
            bytes_before: before,
            bytes_after: after,
            note: None,
        });
    }

    Ok(sum)
}

fn write_atomic(abs: &Path, data: &str) -> Result<()> {
    let parent = abs.parent().ok_or_else(|| anyhow!("{} has no parent directory", abs.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(data.as_bytes())?;
    tmp.persist(abs)?;
    Ok(())
}
