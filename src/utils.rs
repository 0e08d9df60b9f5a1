//! Utility functions for output path construction

use chrono::NaiveDateTime;

/// Longest description fragment carried into a folder name
const MAX_DESC_CHARS: usize = 50;

/// Make a string safe to use as a single path component.
///
/// Path separators, characters Windows filesystems reject, and control
/// characters become underscores; surrounding whitespace and trailing dots
/// are dropped. An input that sanitizes to nothing becomes `"unknown"`.
#[must_use]
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_end_matches(['.', ' ']).to_string();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// First `MAX_DESC_CHARS` characters of a description
#[must_use]
pub fn truncate_desc(desc: &str) -> String {
    desc.chars().take(MAX_DESC_CHARS).collect()
}

/// Folder name for one item: `<timestamp>_<desc>`.
///
/// The timestamp renders as `%Y-%m-%d_%H-%M-%S`; when the item carries no
/// derivable create-time the platform item ID substitutes for it, so the
/// name stays deterministic across runs. The description part is truncated,
/// sanitized, and omitted entirely when empty.
#[must_use]
pub fn item_folder_name(create_time: Option<NaiveDateTime>, item_id: &str, desc: &str) -> String {
    let stamp = match create_time {
        Some(created) => created.format("%Y-%m-%d_%H-%M-%S").to_string(),
        None => item_id.to_string(),
    };
    let desc = desc.trim();
    if desc.is_empty() {
        return stamp;
    }
    format!("{stamp}_{}", sanitize_component(&truncate_desc(desc)))
}
