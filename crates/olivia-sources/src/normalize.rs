//! Helpers for turning heterogeneous provider JSON into plain text fields

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Longest summary kept on a record, in characters
pub const MAX_SUMMARY_CHARS: usize = 600;

/// Extract a value using a simple path notation: `titles[0].title`, `address.city`
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;

    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let key = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].strip_suffix(']')?;

            if !key.is_empty() {
                current = current.get(key)?;
            }

            let index: usize = index_str.parse().ok()?;
            current = current.get(index)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current)
}

/// Scalar at `path` rendered as cleaned text; empty strings count as absent
pub fn text_at(value: &Value, path: &str) -> Option<String> {
    let text = match extract_path(value, path)? {
        Value::String(s) => clean_text(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// First path yielding a non-empty text
pub fn first_text(value: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| text_at(value, path))
}

/// Array at the first path that holds one
pub fn first_array<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Vec<Value>> {
    if let Value::Array(items) = value {
        return Some(items);
    }
    paths
        .iter()
        .find_map(|path| extract_path(value, path).and_then(Value::as_array))
}

/// Strings of an array at `path`, cleaned, empty ones dropped
pub fn texts_at(value: &Value, path: &str) -> Vec<String> {
    extract_path(value, path)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(clean_text)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Date at the first matching path as `YYYY-MM-DD`.
///
/// Accepts ISO dates or datetimes, `DD/MM/YYYY`, and epoch milliseconds.
/// Unparseable strings are kept as given.
pub fn first_date(value: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| match extract_path(value, path)? {
        Value::Number(n) => n
            .as_i64()
            .filter(|ms| *ms > 0)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|d| d.date_naive().to_string()),
        Value::String(s) => normalize_date(s),
        _ => None,
    })
}

fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date.to_string());
        }
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%d/%m/%Y") {
            return Some(date.to_string());
        }
    }
    Some(raw.to_string())
}

fn markup() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"))
}

fn whitespace() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Remove tags, decode common entities and collapse whitespace
pub fn clean_text(raw: &str) -> String {
    let without_tags = markup().replace_all(raw, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    whitespace().replace_all(decoded.trim(), " ").into_owned()
}

/// Cut text to `max` characters on a word boundary, with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    let cut = head.rfind(' ').filter(|&i| i > max / 2).unwrap_or(head.len());
    format!("{}…", head[..cut].trim_end())
}
