//! # Report Censoring
//!
//! Removes credentials from a report before it leaves the process: values
//! of configured fields anywhere in the context are replaced, and tokens
//! embedded in free-form messages are redacted.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Replacement for censored field values
pub const CENSORED: &str = "<CENSORED>";

/// Replacement for credentials found inside messages
pub const REDACTED: &str = "[REDACTED]";

static CREDENTIAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // api_key=..., password: ..., token=...
        Regex::new(r#"(?i)\b(api[_-]?key|key|token|secret|password|credential)s?["']?\s*[=:]\s*["']?([^"'\s&]+)"#).unwrap(),
        // OAuth bearer tokens
        Regex::new(r"(?i)\b(bearer)\s+([a-zA-Z0-9\._\-]+)").unwrap(),
        // JWTs
        Regex::new(r"eyJ[a-zA-Z0-9\-_]+\.eyJ[a-zA-Z0-9\-_]+\.[a-zA-Z0-9\-_]+").unwrap(),
    ]
});

/// Replaces the value of every key named in `fields`, at any depth
///
/// Keys are compared case-insensitively. Returns the number of values
/// replaced.
pub fn censor_fields(value: &mut Value, fields: &[String]) -> usize {
    match value {
        Value::Object(map) => {
            let mut censored = 0;
            for (key, entry) in map.iter_mut() {
                if fields.iter().any(|f| f.eq_ignore_ascii_case(key)) {
                    *entry = Value::String(CENSORED.to_string());
                    censored += 1;
                } else {
                    censored += censor_fields(entry, fields);
                }
            }
            censored
        }
        Value::Array(items) => items.iter_mut().map(|item| censor_fields(item, fields)).sum(),
        _ => 0,
    }
}

/// Redacts credentials embedded in a message, keeping the key names
pub fn sanitize_message(message: &str) -> String {
    let mut sanitized = message.to_string();

    for pattern in CREDENTIAL_PATTERNS.iter() {
        sanitized = pattern
            .replace_all(&sanitized, |caps: &Captures| match caps.get(1) {
                Some(key) if key.as_str().eq_ignore_ascii_case("bearer") => format!("{} {}", key.as_str(), REDACTED),
                Some(key) => format!("{}={}", key.as_str(), REDACTED),
                None => REDACTED.to_string(),
            })
            .into_owned();
    }

    sanitized
}
