use std::collections::BTreeMap;

use crate::extract::{self, ENTRY_POINT_PATH, MANIFEST_PATH, README_PATH};
use crate::score;
use crate::wire::{AppType, GeneratedProject};

pub const MAIN_DART: &str = r#"import 'package:flutter/material.dart';

void main() {
  runApp(const MyApp());
}

class MyApp extends StatelessWidget {
  const MyApp({super.key});

  @override
  Widget build(BuildContext context) {
    return MaterialApp(
      title: 'Flutter App',
      debugShowCheckedModeBanner: false,
      home: const HomePage(),
    );
  }
}

class HomePage extends StatelessWidget {
  const HomePage({super.key});

  @override
  Widget build(BuildContext context) {
    return Scaffold(
      appBar: AppBar(
        title: const Text('مرحباً بك في التطبيق'),
      ),
      body: Center(
        child: Column(
          mainAxisAlignment: MainAxisAlignment.center,
          children: [
            const Icon(
              Icons.flutter_dash,
              size: 100,
              color: Colors.blue,
            ),
            const SizedBox(height: 20),
            Text(
              'تم إنشاء التطبيق بنجاح!',
              style: Theme.of(context).textTheme.headlineSmall,
            ),
          ],
        ),
      ),
    );
  }
}"#;

pub const PUBSPEC_YAML: &str = r#"name: flutter_app
description: A new Flutter application.
publish_to: 'none'
version: 1.0.0+1

environment:
  sdk: ">=3.0.0 <4.0.0"

dependencies:
  flutter:
    sdk: flutter
  provider: ^6.0.5
  get_it: ^7.6.4
  freezed_annotation: ^2.4.1

dev_dependencies:
  flutter_test:
    sdk: flutter
  build_runner: ^2.4.7
  freezed: ^2.4.6
  json_serializable: ^6.7.1

flutter:
  uses-material-design: true"#;

pub const README_MD: &str = r#"# Flutter Application

A Flutter application scaffolded by FlutterHub following Clean Architecture
conventions.

## Features

- Material Design 3 interface
- Clean Architecture layering
- State management with Provider
- Right-to-left (Arabic) friendly layout

## Getting started

1. Install the Flutter SDK (3.0 or newer).
2. Fetch the packages with `flutter pub get`.
3. Start the app on a device or emulator with `flutter run`.

## Project layout

- `lib/main.dart`: application entry point and home screen
- `pubspec.yaml`: package manifest and dependencies

## Architecture

The app separates concerns into three layers:

- **Presentation layer**: screens and widgets
- **Domain layer**: business rules
- **Data layer**: models, repositories and data sources"#;

pub const FALLBACK_PATTERNS: [&str; 2] = ["Clean Architecture", "MVVM"];

/// The three files every project must carry, keyed by path.
pub fn default_files() -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    files.insert(ENTRY_POINT_PATH.to_string(), MAIN_DART.to_string());
    files.insert(MANIFEST_PATH.to_string(), PUBSPEC_YAML.to_string());
    files.insert(README_PATH.to_string(), README_MD.to_string());
    files
}

/// Canned content for one of the three default paths.
pub fn default_content(path: &str) -> Option<&'static str> {
    match path {
        ENTRY_POINT_PATH => Some(MAIN_DART),
        MANIFEST_PATH => Some(PUBSPEC_YAML),
        README_PATH => Some(README_MD),
        _ => None,
    }
}

/// Minimal always-valid project substituted whenever generation fails.
pub fn project(description: &str, app_type: AppType) -> GeneratedProject {
    let files = default_files();
    let dependencies = extract::dependencies(PUBSPEC_YAML);
    let quality_score = score::quality_score(&files, &dependencies);
    GeneratedProject {
        name: extract::project_name(description),
        description: description.to_string(),
        app_type,
        files,
        dependencies,
        patterns: FALLBACK_PATTERNS.iter().map(|p| p.to_string()).collect(),
        quality_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{self, ValidationRules};

    #[test]
    fn fallback_is_deterministic() {
        let a = project("تطبيق مهام", AppType::Productivity);
        let b = project("تطبيق مهام", AppType::Productivity);
        assert_eq!(a, b);
        assert_eq!(a.files.len(), 3);
        assert_eq!(a.dependencies, vec!["provider", "get_it", "freezed_annotation"]);
    }

    #[test]
    fn fallback_passes_structural_gate() {
        let p = project("Flutter App", AppType::General);
        validate::check_structure(&p.files, &ValidationRules::default()).unwrap();
    }

    #[test]
    fn fallback_round_trips_through_strict_parser() {
        let completion = format!(
            "Here is the project.\n\n// lib/main.dart\n```dart\n{}\n```\n\n# pubspec.yaml\n```yaml\n{}\n```\n\n<!-- README.md -->\n```markdown\n{}\n```\n",
            MAIN_DART, PUBSPEC_YAML, README_MD
        );
        let parsed = extract::parse(&completion);
        assert!(parsed.synthesized.is_empty());
        assert_eq!(parsed.files, default_files());
    }

    #[test]
    fn templates_have_no_fences() {
        for body in [MAIN_DART, PUBSPEC_YAML, README_MD] {
            assert!(!body.contains("```"));
        }
    }
}
