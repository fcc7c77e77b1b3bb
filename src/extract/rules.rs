use once_cell::sync::Lazy;
use regex::Regex;

static CLASS_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bclass\s+(\w+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    EntryPoint,
    Manifest,
    Screen,
    Model,
    Repository,
    Readme,
    Utility,
}

impl FileKind {
    /// Kinds that map to one fixed path; duplicates are dropped rather than renamed.
    pub fn is_singleton(&self) -> bool {
        matches!(self, FileKind::EntryPoint | FileKind::Manifest | FileKind::Readme)
    }
}

/// One row of the classification table.
///
/// A body matches when it contains every `all` needle and, if `any` is
/// non-empty, at least one `any` needle. `template` may use `{class}` (the
/// snake_cased first class name) and `{index}` (running utility counter).
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: FileKind,
    pub all: &'static [&'static str],
    pub any: &'static [&'static str],
    pub template: &'static str,
}

impl Rule {
    pub fn matches(&self, body: &str) -> bool {
        self.all.iter().all(|n| body.contains(n))
            && (self.any.is_empty() || self.any.iter().any(|n| body.contains(n)))
    }
}

pub const FLUTTER_RULES: &[Rule] = &[
    Rule {
        kind: FileKind::EntryPoint,
        all: &[],
        any: &["void main(", "runApp("],
        template: super::ENTRY_POINT_PATH,
    },
    Rule {
        kind: FileKind::Manifest,
        all: &["dependencies:", "flutter"],
        any: &[],
        template: super::MANIFEST_PATH,
    },
    Rule {
        kind: FileKind::Screen,
        all: &["class "],
        any: &["extends StatelessWidget", "extends StatefulWidget"],
        template: "lib/screens/{class}.dart",
    },
    Rule {
        kind: FileKind::Model,
        all: &["class ", "Model"],
        any: &[],
        template: "lib/models/{class}.dart",
    },
    Rule {
        kind: FileKind::Repository,
        all: &["Repository"],
        any: &[],
        template: "lib/repositories/{class}.dart",
    },
    Rule {
        kind: FileKind::Readme,
        all: &["# ", "Flutter"],
        any: &[],
        template: super::README_PATH,
    },
    Rule {
        kind: FileKind::Utility,
        all: &["package:flutter/"],
        any: &[],
        template: "lib/utils/file_{index}.dart",
    },
];

/// Ordered first-match classifier over code block bodies.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(FLUTTER_RULES.to_vec())
    }
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, body: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matches(body))
    }

    /// Render the rule's path template for `body`.
    pub fn path_for(rule: &Rule, body: &str, index: usize) -> String {
        let mut path = rule.template.to_string();
        if path.contains("{class}") {
            path = path.replace("{class}", &class_slug(body));
        }
        if path.contains("{index}") {
            path = path.replace("{index}", &index.to_string());
        }
        path
    }
}

/// First declared class name, snake_cased; `unknown` when there is none.
pub fn class_slug(body: &str) -> String {
    CLASS_NAME
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| snake_case(m.as_str()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map(|n| n.is_lowercase()).unwrap_or(false),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
