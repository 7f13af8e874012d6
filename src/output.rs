//! CLI output formatting.
//!
//! Each command has a `format_*` function returning lines (pure, testable) and
//! a `print_*` wrapper that writes them to stdout. Diagnostics go through
//! `tracing` to stderr, so stdout stays clean for piping.
//!
//! Entities follow one two-level pattern: a header line with a positional
//! index and title, then indented context lines.
//!
//! ```text
//! page (2 entries)
//! 001 Home
//!     uid: blt0a1b
//! 002 About
//!     uid: blt9f8e
//!     Unresolved: $.page_components[1].hero → hero_banner/blt77 (fetch failed: ...)
//! ```

use crate::resolver::ResolvedEntry;
use serde_json::Value;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Header line for an entry: its title, or its uid in parens when untitled.
fn entry_line(index: usize, entry: &Value) -> String {
    match str_field(entry, "title") {
        Some(title) => format!("{} {}", format_index(index), title),
        None => format!(
            "{} ({})",
            format_index(index),
            str_field(entry, "uid").unwrap_or("no uid")
        ),
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

pub fn format_entries(content_type: &str, entries: &[ResolvedEntry]) -> Vec<String> {
    let mut lines = vec![format!(
        "{content_type} ({})",
        plural(entries.len(), "entry", "entries")
    )];
    for (i, entry) in entries.iter().enumerate() {
        lines.push(entry_line(i + 1, &entry.value));
        if let Some(uid) = str_field(&entry.value, "uid") {
            lines.push(format!("{}uid: {uid}", indent(1)));
        }
        if let Some(url) = str_field(&entry.value, "url") {
            lines.push(format!("{}url: {url}", indent(1)));
        }
        for failure in &entry.unresolved {
            lines.push(format!(
                "{}Unresolved: {} → {} ({})",
                indent(1),
                failure.path,
                failure.stub,
                failure.cause
            ));
        }
    }
    let unresolved: usize = entries.iter().map(|e| e.unresolved.len()).sum();
    if unresolved > 0 {
        lines.push(String::new());
        lines.push(format!("{} left unresolved", plural(unresolved, "reference", "references")));
    }
    lines
}

pub fn print_entries(content_type: &str, entries: &[ResolvedEntry]) {
    for line in format_entries(content_type, entries) {
        println!("{line}");
    }
}

pub fn format_locales(locales: &[Value]) -> Vec<String> {
    let mut lines = vec!["Locales".to_string()];
    for (i, locale) in locales.iter().enumerate() {
        let code = str_field(locale, "code").unwrap_or("?");
        let line = match str_field(locale, "name") {
            Some(name) => format!("{} {code} {name}", format_index(i + 1)),
            None => format!("{} {code}", format_index(i + 1)),
        };
        lines.push(line);
        if let Some(fallback) = str_field(locale, "fallback_locale") {
            lines.push(format!("{}fallback: {fallback}", indent(1)));
        }
    }
    lines
}

pub fn print_locales(locales: &[Value]) {
    for line in format_locales(locales) {
        println!("{line}");
    }
}

pub fn format_content_types(content_types: &[Value]) -> Vec<String> {
    let mut lines = vec!["Content types".to_string()];
    for (i, content_type) in content_types.iter().enumerate() {
        let uid = str_field(content_type, "uid").unwrap_or("?");
        let title = str_field(content_type, "title").unwrap_or(uid);
        lines.push(format!("{} {title} ({uid})", format_index(i + 1)));
        if let Some(schema) = content_type.get("schema").and_then(Value::as_array) {
            lines.push(format!("{}{}", indent(1), plural(schema.len(), "field", "fields")));
        }
    }
    lines
}

pub fn print_content_types(content_types: &[Value]) {
    for line in format_content_types(content_types) {
        println!("{line}");
    }
}
