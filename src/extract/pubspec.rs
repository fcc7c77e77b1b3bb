use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;

static DEP_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^  ([A-Za-z_][A-Za-z0-9_]*):").unwrap());

/// Package names declared under `dependencies:`, excluding the Flutter SDK itself.
pub fn dependencies(pubspec: &str) -> Vec<String> {
    match serde_yaml::from_str::<Value>(pubspec) {
        Ok(doc) => match doc.get("dependencies").and_then(Value::as_mapping) {
            Some(map) => map
                .keys()
                .filter_map(Value::as_str)
                .filter(|name| *name != "flutter")
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        },
        // Models often emit slightly broken YAML; fall back to a line scan.
        Err(_) => scan_dependencies(pubspec),
    }
}

fn scan_dependencies(pubspec: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut in_section = false;
    for line in pubspec.lines() {
        if !in_section {
            in_section = line.trim_end() == "dependencies:";
            continue;
        }
        if !line.is_empty() && !line.starts_with(' ') {
            break;
        }
        if let Some(c) = DEP_LINE.captures(line) {
            let name = &c[1];
            if name != "flutter" {
                out.push(name.to_string());
            }
        }
    }
    out
}
