use colored::{ColoredString, Colorize};
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::apply::{ApplySummary, WriteKind};
use crate::generate::Outcome;
use crate::settings::StoredKey;

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn score_badge(score: u8) -> ColoredString {
    let label = format!("{score}/100");
    match score {
        70..=100 => label.green().bold(),
        45..=69 => label.yellow().bold(),
        _ => label.red().bold(),
    }
}

pub fn print_project_dashboard(outcome: &Outcome) {
    let p = &outcome.project;
    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━━ Project ━━━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!(
        "  {}: {}   {}: {}   {}: {}",
        "Name".bold(), p.name,
        "Type".bold(), p.app_type,
        "Score".bold(), score_badge(p.quality_score)
    );
    println!(
        "  {}: {}   {}: {}   {}: {}",
        "Files".cyan().bold(), p.files.len(),
        "Size".cyan().bold(), format_size(p.total_bytes(), DECIMAL),
        "Deps".cyan().bold(), p.dependencies.len()
    );
    if let Some(u) = &outcome.usage {
        println!(
            "  {}: {} prompt + {} completion = {}",
            "Tokens".magenta().bold(), u.prompt_tokens, u.completion_tokens, u.total_tokens
        );
    }
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());

    if let Some(e) = &outcome.error {
        println!("{} {}", "[FALLBACK]".red().bold(), e.user_message());
        println!("  cause: {e}");
    }

    for (path, content) in &p.files {
        println!("  {}  {}", path, format_size(content.len(), DECIMAL).dimmed());
    }
    if !p.dependencies.is_empty() {
        println!("  {}: {}", "dependencies".bold(), p.dependencies.join(", "));
    }
    println!("  {}: {}", "patterns".bold(), p.patterns.join(", "));

    if !outcome.warnings.is_empty() {
        println!("{}", "\nParser warnings:".yellow().bold());
        for w in &outcome.warnings {
            println!(" - {w}");
        }
    }
    println!();
}

pub fn print_apply_dashboard(sum: &ApplySummary, dry: bool) {
    let title = if dry {
        "┏━━━━━━━━━━━━━━━━━━━━━ Write Preview (dry run) ━━━━━━━━━━━━━━━━━━━━━┓"
    } else {
        "┏━━━━━━━━━━━━━━━━━━━━━━━━━━━ Write Results ━━━━━━━━━━━━━━━━━━━━━━━━━━┓"
    };
    println!("\n{}", title.bold());
    println!(
        "  {}: {}   {}: {}   {}: {}   {}: {}",
        "Created".green().bold(), sum.created,
        "Updated".yellow().bold(), sum.updated,
        "Skipped".red().bold(), sum.skipped,
        "Bytes".bold(), format_size(sum.bytes_written, DECIMAL)
    );
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());

    for d in &sum.details {
        let tag = match d.kind {
            WriteKind::Created => "[CREATE]".green().bold(),
            WriteKind::Updated => "[UPDATE]".yellow().bold(),
            WriteKind::Skipped => "[SKIP]".red().bold(),
        };
        match (&d.path, &d.note) {
            (_, Some(note)) => println!("{tag}  {} ({note})", d.rel),
            (Some(p), None) => println!("{tag}  {}  {}", p.display(), size_change(d.bytes_before, d.bytes_after).dimmed()),
            (None, None) => println!("{tag}  {}", d.rel),
        }
    }
}

fn size_change(before: Option<u64>, after: u64) -> String {
    match before {
        Some(b) => format!("{} -> {}", format_size(b, DECIMAL), format_size(after, DECIMAL)),
        None => format_size(after, DECIMAL),
    }
}

pub fn print_keys(keys: &[StoredKey]) {
    if keys.is_empty() {
        println!("(no stored keys)");
        return;
    }
    for k in keys {
        println!(
            "{}  {:<10} {}  {}",
            k.id.to_string().dimmed(),
            format!("{:?}", k.provider).to_lowercase().cyan(),
            k.masked(),
            k.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}
