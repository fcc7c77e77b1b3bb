use std::path::{Component, Path, PathBuf};

/// Normalize a generated file path to a clean relative form.
///
/// Rules:
/// - Leading `./` and `/` are stripped; backslashes become `/`.
/// - Any `..` segment, drive prefix or empty result is rejected.
/// - Repeated separators collapse (`lib//main.dart` -> `lib/main.dart`).
pub fn normalize_relative(candidate: &str) -> Option<String> {
    let unified = candidate.trim().replace('\\', "/");
    let trimmed = unified.trim_start_matches("./").trim_start_matches('/');

    let mut parts: Vec<String> = Vec::new();
    for comp in Path::new(trimmed).components() {
        match comp {
            Component::Normal(seg) => parts.push(seg.to_string_lossy().to_string()),
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Resolve `rel` under `root`, refusing anything that would escape it.
pub fn resolve_within(root: &Path, rel: &str) -> Option<PathBuf> {
    let clean = normalize_relative(rel)?;
    Some(root.join(clean))
}
