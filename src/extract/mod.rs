use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::fallback;
use crate::safety;

mod pubspec;
pub mod rules;

pub use pubspec::dependencies;
use rules::{Classifier, FileKind};

pub const ENTRY_POINT_PATH: &str = "lib/main.dart";
pub const MANIFEST_PATH: &str = "pubspec.yaml";
pub const README_PATH: &str = "README.md";

/// Bodies shorter than these (trimmed chars) are treated as noise.
const STRICT_MIN_BODY: usize = 20;
const LOOSE_MIN_BODY: usize = 10;

static PATH_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?://|#|<!--)\s*(?:[Ff]ile:\s*)?`?([\w./-]+\.(?:dart|ya?ml|md|json|arb))`?\s*(?:-->)?\s*$",
    )
    .unwrap()
});

static NAME_AR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:تطبيق|برنامج|نظام)\s+(\S+)").unwrap());
static NAME_EN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\b(?:app|application)\s+(?:called|named)\s+["']?([\w-]+)"#).unwrap());

/// A fenced code block located in a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Fence<'a> {
    pub lang: &'a str,
    pub body: &'a str,
    /// The line right above the opening fence, if any.
    pub preceding: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    Loose,
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub files: BTreeMap<String, String>,
    pub mode: ParseMode,
    pub warnings: Vec<String>,
    /// Default files filled in because the completion lacked them.
    pub synthesized: Vec<String>,
}

impl ParseOutcome {
    /// Only the files the completion itself supplied.
    pub fn produced(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .filter(|(path, _)| !self.synthesized.contains(path))
            .map(|(path, body)| (path.clone(), body.clone()))
            .collect()
    }
}

/// Every closed fenced block in document order. Unterminated fences are ignored.
pub fn fenced_blocks(text: &str) -> Vec<Fence<'_>> {
    scan_fences(text).0
}

/// Leading backtick run of a fence line, or 0 when the line is not a fence.
fn fence_len(line: &str) -> usize {
    let n = line.len() - line.trim_start_matches('`').len();
    if n >= 3 {
        n
    } else {
        0
    }
}

/// Closed blocks plus whether a fence was still open at the end of the text.
///
/// A tagged fence inside an open block (a README quoting a `bash` snippet)
/// opens a nested level, and each bare fence closes one, so the outer block
/// only ends on its own closing fence. The outer fence closes only on a bare
/// run at least as long as its opener.
fn scan_fences(text: &str) -> (Vec<Fence<'_>>, bool) {
    let mut out = Vec::new();
    let mut prev_line: Option<&str> = None;
    // (lang, body_start, preceding, opener length)
    let mut open: Option<(&str, usize, Option<&str>, usize)> = None;
    let mut depth = 0usize;
    let mut offset = 0usize;

    for raw in text.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        let line_start = offset;
        offset += raw.len();
        let t = line.trim();
        let ticks = fence_len(t);

        match open {
            None => {
                if ticks > 0 {
                    open = Some((t[ticks..].trim(), offset, prev_line, ticks));
                    depth = 1;
                }
            }
            Some((lang, body_start, preceding, opener)) => {
                let bare = ticks > 0 && t.len() == ticks;
                if bare && depth > 1 {
                    depth -= 1;
                } else if bare && ticks >= opener {
                    let body = if line_start > body_start {
                        let b = &text[body_start..line_start];
                        let b = b.strip_suffix('\n').unwrap_or(b);
                        b.strip_suffix('\r').unwrap_or(b)
                    } else {
                        ""
                    };
                    out.push(Fence { lang, body, preceding });
                    open = None;
                    depth = 0;
                } else if ticks > 0 && !bare {
                    depth += 1;
                }
            }
        }
        prev_line = Some(line);
    }
    (out, open.is_some())
}

pub fn parse(text: &str) -> ParseOutcome {
    parse_with(text, &Classifier::default())
}

/// Turn a raw completion into a path -> content map.
pub fn parse_with(text: &str, classifier: &Classifier) -> ParseOutcome {
    let (blocks, unterminated) = scan_fences(text);
    let mut warnings = Vec::new();
    if unterminated {
        warnings.push("ignored unterminated code fence at end of completion".to_string());
    }

    let mut files = strict_pass(&blocks, &mut warnings);
    let mode = if files.is_empty() {
        files = loose_pass(&blocks, classifier, &mut warnings);
        ParseMode::Loose
    } else {
        ParseMode::Strict
    };

    let mut synthesized = Vec::new();
    for path in [ENTRY_POINT_PATH, MANIFEST_PATH, README_PATH] {
        if !files.contains_key(path) {
            if let Some(content) = fallback::default_content(path) {
                files.insert(path.to_string(), content.to_string());
                synthesized.push(path.to_string());
            }
        }
    }

    ParseOutcome { files, mode, warnings, synthesized }
}

fn strict_pass(blocks: &[Fence<'_>], warnings: &mut Vec<String>) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    for block in blocks {
        let Some(path) = block
            .preceding
            .and_then(|l| PATH_COMMENT.captures(l))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };
        if block.body.trim().chars().count() < STRICT_MIN_BODY {
            warnings.push(format!("dropped {} (body too short)", path));
            continue;
        }
        let Some(path) = safety::normalize_relative(path) else {
            warnings.push(format!("dropped {} (unsafe path)", path));
            continue;
        };
        if files.contains_key(&path) {
            warnings.push(format!("dropped duplicate block for {}", path));
            continue;
        }
        files.insert(path, block.body.to_string());
    }
    files
}

fn loose_pass(
    blocks: &[Fence<'_>],
    classifier: &Classifier,
    warnings: &mut Vec<String>,
) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    let mut utility_index = 0usize;

    for block in blocks {
        let body = block.body.trim();
        if body.chars().count() < LOOSE_MIN_BODY {
            continue;
        }
        let Some(rule) = classifier.classify(body) else {
            warnings.push(format!("skipped unrecognised {} block", lang_label(block.lang)));
            continue;
        };
        if rule.kind == FileKind::Utility {
            utility_index += 1;
        }
        let path = Classifier::path_for(rule, body, utility_index);

        if files.contains_key(&path) {
            if rule.kind.is_singleton() {
                warnings.push(format!("dropped duplicate block for {}", path));
                continue;
            }
            let renamed = disambiguate(&path, &files);
            warnings.push(format!("renamed colliding {} to {}", path, renamed));
            files.insert(renamed, body.to_string());
        } else {
            files.insert(path, body.to_string());
        }
    }
    files
}

fn lang_label(lang: &str) -> &str {
    if lang.is_empty() {
        "untagged"
    } else {
        lang
    }
}

/// `lib/screens/home.dart` -> `lib/screens/home_2.dart`, `_3`, ... until free.
fn disambiguate(path: &str, files: &BTreeMap<String, String>) -> String {
    let (stem, ext) = match path.rfind('.') {
        Some(dot) if dot > path.rfind('/').map(|s| s + 1).unwrap_or(0) => (&path[..dot], &path[dot..]),
        _ => (path, ""),
    };
    let mut n = 2usize;
    loop {
        let candidate = format!("{stem}_{n}{ext}");
        if !files.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Project name from the user's description, `flutter_app` when none is found.
pub fn project_name(description: &str) -> String {
    NAME_AR
        .captures(description)
        .or_else(|| NAME_EN.captures(description))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "flutter_app".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_BLOCK: &str = "import 'package:flutter/material.dart';\n\nvoid main() {\n  runApp(const ShopApp());\n}";
    const PUBSPEC_BLOCK: &str = "name: shop\ndependencies:\n  flutter:\n    sdk: flutter\n  provider: ^6.0.5\n\nflutter:\n  uses-material-design: true";

    #[test]
    fn strict_pass_uses_path_comments() {
        let text = format!(
            "Sure!\n\n// lib/main.dart\n```dart\n{MAIN_BLOCK}\n```\n\n# pubspec.yaml\n```yaml\n{PUBSPEC_BLOCK}\n```\n\n// File: lib/screens/cart_screen.dart\n```dart\nimport 'package:flutter/material.dart';\nclass CartScreen extends StatelessWidget {{}}\n```\n"
        );
        let out = parse(&text);
        assert_eq!(out.mode, ParseMode::Strict);
        assert_eq!(out.files["lib/main.dart"], MAIN_BLOCK);
        assert_eq!(out.files["pubspec.yaml"], PUBSPEC_BLOCK);
        assert!(out.files.contains_key("lib/screens/cart_screen.dart"));
        assert_eq!(out.synthesized, vec![README_PATH.to_string()]);
    }

    #[test]
    fn loose_pass_classifies_untagged_blocks() {
        let text = format!(
            "```dart\n{MAIN_BLOCK}\n```\n\n```yaml\n{PUBSPEC_BLOCK}\n```\n\n```dart\nclass ProductModel {{\n  final String id;\n  ProductModel(this.id);\n}}\n```\n\n```dart\nclass ProductRepository {{ }}\n```\n"
        );
        let out = parse(&text);
        assert_eq!(out.mode, ParseMode::Loose);
        assert_eq!(out.files["lib/main.dart"], MAIN_BLOCK);
        assert_eq!(out.files["pubspec.yaml"], PUBSPEC_BLOCK);
        assert!(out.files.contains_key("lib/models/product_model.dart"));
        assert!(out.files.contains_key("lib/repositories/product_repository.dart"));
        assert_eq!(out.synthesized, vec![README_PATH.to_string()]);
    }

    #[test]
    fn colliding_class_paths_are_renamed() {
        let screen = "import 'package:flutter/material.dart';\nclass HomeScreen extends StatelessWidget {}";
        let text = format!("```dart\n{screen}\n```\n```dart\n{screen} // v2\n```\n```dart\n{screen} // v3\n```\n");
        let out = parse(&text);
        assert!(out.files.contains_key("lib/screens/home_screen.dart"));
        assert!(out.files.contains_key("lib/screens/home_screen_2.dart"));
        assert!(out.files.contains_key("lib/screens/home_screen_3.dart"));
        assert_eq!(out.warnings.iter().filter(|w| w.starts_with("renamed")).count(), 2);
    }

    #[test]
    fn duplicate_entry_points_keep_the_first() {
        let second = "void main() => runApp(const OtherApp());";
        let text = format!("```dart\n{MAIN_BLOCK}\n```\n```dart\n{second}\n```\n");
        let out = parse(&text);
        assert_eq!(out.files["lib/main.dart"], MAIN_BLOCK);
        assert!(out.warnings.iter().any(|w| w.contains("duplicate block for lib/main.dart")));
    }

    #[test]
    fn utility_files_are_numbered() {
        let text = "```dart\nimport 'package:flutter/widgets.dart';\nconst gap = SizedBox(height: 8);\n```\n```dart\nimport 'package:flutter/painting.dart';\nconst radius = 12.0;\n```\n";
        let out = parse(text);
        assert!(out.files.contains_key("lib/utils/file_1.dart"));
        assert!(out.files.contains_key("lib/utils/file_2.dart"));
    }

    #[test]
    fn tiny_fence_falls_through_to_defaults() {
        let out = parse("```\nok\n```");
        assert_eq!(out.files, fallback::default_files());
        assert_eq!(out.synthesized.len(), 3);
    }

    #[test]
    fn short_strict_bodies_are_noise() {
        let out = parse("// lib/models/user.dart\n```dart\nclass User {}\n```\n");
        assert_eq!(out.mode, ParseMode::Loose);
        assert!(!out.files.contains_key("lib/models/user.dart"));
    }

    #[test]
    fn unsafe_paths_are_dropped() {
        let body = "class Evil { final String payload = 'x'; }";
        let out = parse(&format!("// ../../etc/evil.dart\n```dart\n{body}\n```\n"));
        assert!(out.files.keys().all(|k| !k.contains("..")));
        assert!(out.warnings.iter().any(|w| w.contains("unsafe path")));
    }

    #[test]
    fn unterminated_fence_is_ignored() {
        assert!(fenced_blocks("```dart\nvoid main() {}\n").is_empty());
        let blocks = fenced_blocks("text\n```dart\nvoid main() {}\n```\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lang, "dart");
        assert_eq!(blocks[0].preceding, Some("text"));
    }

    #[test]
    fn readme_with_nested_snippet_keeps_following_files() {
        let screen = "import 'package:flutter/material.dart';\nclass HomeScreen extends StatelessWidget {}";
        let readme = "# Shop\nRun:\n```bash\nflutter run\n```\nDone.";
        let text = format!(
            "// lib/main.dart\n```dart\n{MAIN_BLOCK}\n```\n\n<!-- README.md -->\n```markdown\n{readme}\n```\n\n// lib/screens/home_screen.dart\n```dart\n{screen}\n```\n"
        );
        let out = parse(&text);
        assert_eq!(out.files["README.md"], readme);
        assert_eq!(out.files["lib/screens/home_screen.dart"], screen);
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    }

    #[test]
    fn longer_outer_fence_wraps_bare_inner_fences() {
        let blocks = fenced_blocks("````markdown\nsee:\n```\ncode\n```\n````\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "see:\n```\ncode\n```");
    }

    #[test]
    fn unterminated_fence_is_reported() {
        let out = parse("// lib/main.dart\n```dart\nvoid main() => runApp(const App());\n");
        assert!(out.warnings.iter().any(|w| w.contains("unterminated code fence")));
    }

    #[test]
    fn produced_excludes_synthesized_defaults() {
        let text = format!("// lib/main.dart\n```dart\n{MAIN_BLOCK}\n```\n");
        let out = parse(&text);
        let produced = out.produced();
        assert_eq!(produced.keys().collect::<Vec<_>>(), vec!["lib/main.dart"]);
        assert!(out.files.contains_key(MANIFEST_PATH));
    }

    #[test]
    fn project_name_from_description() {
        assert_eq!(project_name("أريد إنشاء تطبيق متجر إلكتروني"), "متجر");
        assert_eq!(project_name("Build an app called FitTrack for runners"), "FitTrack");
        assert_eq!(project_name("something vague"), "flutter_app");
    }
}
