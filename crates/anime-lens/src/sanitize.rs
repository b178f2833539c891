//! Helpers for sanitizing data before it enters tracing spans and error messages.
//!
//! Screenshot paths can reveal a user's directory layout and provider error
//! bodies can be arbitrarily large, so neither goes into logs unfiltered.

use std::path::Path;

/// Upper bound for provider response text quoted in logs and errors.
pub const MAX_LOGGED_BODY_LENGTH: usize = 200;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Truncates `body` to [`MAX_LOGGED_BODY_LENGTH`] characters.
pub fn truncate_for_log(body: &str) -> String {
    match body.char_indices().nth(MAX_LOGGED_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... (truncated)", &body[..cut]),
        None => body.to_string(),
    }
}
