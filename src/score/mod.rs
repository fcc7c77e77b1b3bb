use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::extract::{ENTRY_POINT_PATH, MANIFEST_PATH, README_PATH};

const BASE: u32 = 20;
const FOLDER_POINTS: u32 = 4;
const INDICATOR_POINTS: u32 = 2;
const BULK_POINTS: u32 = 3;

const FOLDERS: &[&str] = &[
    "models/",
    "screens/",
    "providers/",
    "repositories/",
    "services/",
    "widgets/",
    "config/",
    "utils/",
];

/// Content that counts as state management even without a providers/ folder.
const STATE_USAGE: &[&str] = &["ChangeNotifierProvider", "MultiProvider", "Riverpod"];

/// (all-of groups, any-of within each group)
const INDICATORS: &[&[&[&str]]] = &[
    &[&["toJson(", "fromJson("]],
    &[&["try {"], &["catch"]],
    &[&["async"], &["await"]],
    &[&["StateNotifier", "ChangeNotifier"]],
    &[&["validator", "validate("]],
    &[&["AppLocalizations", "flutter_localizations", "package:intl"]],
    &[&["ThemeData"]],
];

const BULK_CLASSES: usize = 10;
const BULK_METHODS: usize = 30;
const BULK_LINES: usize = 500;
const BULK_DEPENDENCIES: usize = 5;

static CLASS_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bclass\s+\w+").unwrap());
static METHOD_SIG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*[\w<>?,\[\] ]+\s+\w+\([^)]*\)\s*(?:async\s*)?(?:\{|=>)").unwrap()
});

/// Heuristic 0..=100 resemblance to a well organised Flutter project.
///
/// Every component is a presence check or a count threshold, so adding
/// files or dependencies never lowers the score.
pub fn quality_score(files: &BTreeMap<String, String>, dependencies: &[String]) -> u8 {
    let mut score = BASE;

    if files.contains_key(ENTRY_POINT_PATH) {
        score += 10;
    }
    if files.contains_key(MANIFEST_PATH) {
        score += 5;
    }
    if files.contains_key(README_PATH) {
        score += 5;
    }

    let has_content = |needle: &str| files.values().any(|c| c.contains(needle));

    for folder in FOLDERS {
        let mut present = files.keys().any(|p| p.contains(folder));
        if *folder == "providers/" && !present {
            present = STATE_USAGE.iter().any(|n| has_content(n));
        }
        if present {
            score += FOLDER_POINTS;
        }
    }

    for groups in INDICATORS {
        if groups.iter().all(|any_of| any_of.iter().any(|n| has_content(n))) {
            score += INDICATOR_POINTS;
        }
    }

    let classes: usize = files.values().map(|c| CLASS_DECL.find_iter(c).count()).sum();
    let methods: usize = files.values().map(|c| METHOD_SIG.find_iter(c).count()).sum();
    let lines: usize = files.values().map(|c| c.lines().count()).sum();

    for (value, threshold) in [
        (classes, BULK_CLASSES),
        (methods, BULK_METHODS),
        (lines, BULK_LINES),
        (dependencies.len(), BULK_DEPENDENCIES),
    ] {
        if value >= threshold {
            score += BULK_POINTS;
        }
    }

    score.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    fn deps(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_files_score_base_plus_file_bonuses() {
        let files = fallback::default_files();
        assert_eq!(quality_score(&files, &deps(&["provider", "get_it", "freezed_annotation"])), 40);
    }

    #[test]
    fn empty_project_scores_base() {
        assert_eq!(quality_score(&BTreeMap::new(), &[]), 20);
    }

    #[test]
    fn score_is_monotone_as_folders_are_added() {
        let mut files = fallback::default_files();
        let mut last = quality_score(&files, &[]);
        let additions = [
            ("lib/models/user.dart", "class User {\n  Map<String, dynamic> toJson() => {};\n}"),
            ("lib/screens/home.dart", "class Home extends StatelessWidget {}"),
            ("lib/providers/cart.dart", "class Cart extends ChangeNotifier {}"),
            ("lib/repositories/user_repository.dart", "Future<void> load() async {\n  try {\n    await fetch();\n  } catch (e) {}\n}"),
            ("lib/services/api.dart", "class Api {}"),
            ("lib/widgets/button.dart", "class Button {}"),
            ("lib/config/env.dart", "const env = 'dev';"),
            ("lib/utils/validators.dart", "String? validator(String v) => null;"),
            ("lib/l10n/strings.dart", "import 'package:intl/intl.dart';"),
        ];
        for (path, body) in additions {
            files.insert(path.to_string(), body.to_string());
            let next = quality_score(&files, &[]);
            assert!(next >= last, "{path} lowered the score: {last} -> {next}");
            last = next;
        }
        assert!(last > 40);
    }

    #[test]
    fn score_is_clamped_to_100() {
        let mut files = fallback::default_files();
        let mut big = String::new();
        for i in 0..40 {
            big.push_str(&format!(
                "class Widget{i} extends ChangeNotifier {{\n  Future<void> load{i}() async {{\n    try {{ await run(); }} catch (e) {{}}\n  }}\n}}\n"
            ));
        }
        big.push_str(&"// filler\n".repeat(400));
        for folder in FOLDERS {
            files.insert(format!("lib/{folder}all.dart"), big.clone());
        }
        files.insert(
            "lib/l10n.dart".into(),
            "AppLocalizations.of(context); validator; toJson(; ThemeData()".into(),
        );
        let score = quality_score(&files, &deps(&["a", "b", "c", "d", "e", "f"]));
        assert!(score <= 100);
        assert_eq!(score, 98);
    }

    #[test]
    fn provider_usage_counts_as_state_layer() {
        let mut files = fallback::default_files();
        let before = quality_score(&files, &[]);
        files.insert("lib/app.dart".into(), "MultiProvider(providers: [])".into());
        assert_eq!(quality_score(&files, &[]), before + FOLDER_POINTS as u8);
    }
}
