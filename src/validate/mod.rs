use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::ContentError;
use crate::extract::{self, ENTRY_POINT_PATH, MANIFEST_PATH};

/// Fragments that mark a completion as a tutorial rather than code.
const INSTRUCTION_PHRASES: &[&str] = &[
    "here's how",
    "here’s how",
    "here is how",
    "follow these steps",
    "step 1:",
    "you will need to",
    "open your terminal",
    "run the following command",
];

const ROOT_UI_MARKERS: &[&str] = &[
    "MaterialApp",
    "CupertinoApp",
    "WidgetsApp",
    "extends StatelessWidget",
    "extends StatefulWidget",
];

static CLASS_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*(?:abstract\s+)?class\s+\w+").unwrap());
static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+['"]"#).unwrap());
static FLUTTER_SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^flutter:\s*$").unwrap());

/// The one threshold set applied to every generated project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationRules {
    pub min_total_chars: usize,
    pub min_classes: usize,
    pub min_imports: usize,
    /// Require models/, screens/ and a state or data layer folder.
    pub require_layers: bool,
    pub min_code_fences: usize,
    pub min_import_density: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_total_chars: 1_500,
            min_classes: 2,
            min_imports: 1,
            require_layers: false,
            min_code_fences: 2,
            min_import_density: 3,
        }
    }
}

/// Reject completions that explain how to build the app instead of building it.
pub fn check_prose(raw: &str, rules: &ValidationRules) -> Result<(), ContentError> {
    let lower = raw.to_lowercase();
    let instructional = INSTRUCTION_PHRASES.iter().any(|p| lower.contains(p));
    if !instructional {
        return Ok(());
    }
    let fences = extract::fenced_blocks(raw).len();
    let imports = IMPORT_LINE.find_iter(raw).count();
    if fences < rules.min_code_fences && imports < rules.min_import_density {
        return Err(ContentError::InstructionsInsteadOfCode);
    }
    Ok(())
}

/// Check the parsed file set against the structural checklist.
///
/// Callers pass only the files the completion supplied; defaults filled in
/// by the parser would otherwise satisfy every minimum on their own.
pub fn check_structure(files: &BTreeMap<String, String>, rules: &ValidationRules) -> Result<(), ContentError> {
    let mut missing = Vec::new();

    match files.get(ENTRY_POINT_PATH) {
        Some(main) => {
            if !main.contains("runApp(") {
                missing.push("entry point call (runApp)".to_string());
            }
            if !ROOT_UI_MARKERS.iter().any(|m| main.contains(m)) {
                missing.push("root UI class".to_string());
            }
        }
        None => missing.push(format!("entry point ({ENTRY_POINT_PATH})")),
    }

    match files.get(MANIFEST_PATH) {
        Some(manifest) => {
            if !manifest.contains("dependencies:") {
                missing.push("manifest dependencies section".to_string());
            }
            if !FLUTTER_SECTION.is_match(manifest) {
                missing.push("manifest flutter section".to_string());
            }
        }
        None => missing.push(format!("manifest ({MANIFEST_PATH})")),
    }

    if rules.require_layers {
        let has = |dir: &str| files.keys().any(|p| p.contains(dir));
        if !has("models/") {
            missing.push("models/ folder".to_string());
        }
        if !has("screens/") {
            missing.push("screens/ folder".to_string());
        }
        if !has("providers/") && !has("repositories/") {
            missing.push("providers/ or repositories/ folder".to_string());
        }
    }

    let total_chars: usize = files.values().map(|c| c.chars().count()).sum();
    if total_chars < rules.min_total_chars {
        missing.push(format!("at least {} characters of code (got {})", rules.min_total_chars, total_chars));
    }
    let classes: usize = files.values().map(|c| CLASS_DECL.find_iter(c).count()).sum();
    if classes < rules.min_classes {
        missing.push(format!("at least {} classes (got {})", rules.min_classes, classes));
    }
    let imports: usize = files.values().map(|c| IMPORT_LINE.find_iter(c).count()).sum();
    if imports < rules.min_imports {
        missing.push(format!("at least {} imports (got {})", rules.min_imports, imports));
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ContentError::InsufficientStructure { missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    #[test]
    fn prose_without_code_is_rejected() {
        let raw = "Great idea! Here's how you can build it:\n\nStep 1: install Flutter.\nStep 2: create a project.";
        assert_eq!(
            check_prose(raw, &ValidationRules::default()),
            Err(ContentError::InstructionsInsteadOfCode)
        );
    }

    #[test]
    fn phrasing_with_enough_code_passes() {
        let raw = "Here's how the app is structured:\n```dart\nvoid main() {}\n```\n```yaml\nname: a\n```\n";
        assert!(check_prose(raw, &ValidationRules::default()).is_ok());
    }

    #[test]
    fn code_without_phrasing_passes_prose_gate() {
        assert!(check_prose("no fences at all", &ValidationRules::default()).is_ok());
    }

    #[test]
    fn empty_file_set_lists_every_gap() {
        let err = check_structure(&BTreeMap::new(), &ValidationRules::default()).unwrap_err();
        let ContentError::InsufficientStructure { missing } = err else {
            panic!("unexpected error kind");
        };
        assert!(missing.iter().any(|m| m.starts_with("entry point")));
        assert!(missing.iter().any(|m| m.starts_with("manifest")));
        assert!(missing.iter().any(|m| m.contains("characters")));
    }

    #[test]
    fn layer_requirement_is_opt_in() {
        let files = fallback::default_files();
        assert!(check_structure(&files, &ValidationRules::default()).is_ok());

        let strict = ValidationRules { require_layers: true, ..ValidationRules::default() };
        let err = check_structure(&files, &strict).unwrap_err();
        assert!(err.to_string().contains("models/ folder"));
    }

    #[test]
    fn a_lone_screen_is_too_small() {
        let files = BTreeMap::from([(
            "lib/screens/home_screen.dart".to_string(),
            "import 'package:flutter/material.dart';\nclass HomeScreen extends StatelessWidget {}".to_string(),
        )]);
        let err = check_structure(&files, &ValidationRules::default()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("characters"));
        assert!(text.contains("classes"));
        assert!(text.contains("entry point"));
    }

    #[test]
    fn entry_point_without_run_app_fails() {
        let mut files = fallback::default_files();
        files.insert(ENTRY_POINT_PATH.into(), fallback::MAIN_DART.replace("runApp(", "start("));
        let err = check_structure(&files, &ValidationRules::default()).unwrap_err();
        assert!(err.to_string().contains("runApp"));
    }
}
