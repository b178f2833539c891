//! Turning model replies into labels and validated details.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::error::CatalogError;
use super::prompt::UNIDENTIFIED_SENTINEL;
use super::AnimeDetails;
use crate::sanitize;

static RE_FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").unwrap());

/// Interprets an identification reply. An empty reply or the `Unknown`
/// sentinel (any case) means the model could not place the image.
pub fn parse_label(reply: &str) -> Result<String, CatalogError> {
    let label = reply.trim();
    if label.is_empty() || label.eq_ignore_ascii_case(UNIDENTIFIED_SENTINEL) {
        return Err(CatalogError::Unidentified);
    }
    Ok(label.to_string())
}

/// Returns the contents of the first fenced code block, or the whole reply
/// when there is none.
pub fn extract_json_block(reply: &str) -> &str {
    RE_FENCED_BLOCK
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| reply.trim())
}

/// Parses and validates an enrichment reply. Either every field is present
/// and well-formed or the whole reply is rejected.
pub fn parse_details(reply: &str) -> Result<AnimeDetails, CatalogError> {
    let json = extract_json_block(reply);
    let value: Value = serde_json::from_str(json).map_err(|e| {
        CatalogError::InvalidResponse(format!(
            "reply is not valid JSON ({}): {}",
            e,
            sanitize::truncate_for_log(json)
        ))
    })?;

    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(CatalogError::InvalidResponse(format!(
                "reply must be a JSON object, got {}",
                type_name(&other)
            )))
        }
    };

    Ok(AnimeDetails {
        title: required_text(fields.remove("animeName"), "animeName", true)?,
        summary: required_text(fields.remove("plotSummary"), "plotSummary", true)?,
        categories: required_categories(fields.remove("animeType"))?,
        regional_availability: required_text(
            fields.remove("streamingPlatformCanada"),
            "streamingPlatformCanada",
            false,
        )?,
        community_sentiment: required_text(fields.remove("redditRating"), "redditRating", false)?,
    })
}

fn required_text(value: Option<Value>, key: &str, non_empty: bool) -> Result<String, CatalogError> {
    match value {
        Some(Value::String(s)) => {
            let s = s.trim();
            if non_empty && s.is_empty() {
                return Err(missing(key));
            }
            Ok(s.to_string())
        }
        None | Some(Value::Null) => Err(missing(key)),
        Some(other) => Err(CatalogError::InvalidResponse(format!(
            "field `{}` must be a string, got {}",
            key,
            type_name(&other)
        ))),
    }
}

fn required_categories(value: Option<Value>) -> Result<Vec<String>, CatalogError> {
    let items = match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Err(missing("animeType")),
        Some(other) => {
            return Err(CatalogError::InvalidResponse(format!(
                "field `animeType` must be an array, got {}",
                type_name(&other)
            )))
        }
    };

    let mut categories = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) if !s.trim().is_empty() => categories.push(s.trim().to_string()),
            Value::String(_) => {}
            other => {
                return Err(CatalogError::InvalidResponse(format!(
                    "`animeType` entries must be strings, got {}",
                    type_name(&other)
                )))
            }
        }
    }

    if categories.is_empty() {
        return Err(CatalogError::InvalidResponse(
            "field `animeType` is empty".to_string(),
        ));
    }
    Ok(categories)
}

fn missing(key: &str) -> CatalogError {
    CatalogError::InvalidResponse(format!("missing required field `{}`", key))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
