//! CSV export of completed records.

use std::fs;
use std::path::{Path, PathBuf};

use crate::batch::AnimeRecord;
use crate::error::ExportError;

pub const HEADERS: [&str; 6] = [
    "Anime Name",
    "Plot Summary",
    "Type/Genre",
    "Streaming Platform (Canada)",
    "Reddit Rating",
    "Original File",
];

/// Quotes `field` when it contains a comma, a double quote or a newline,
/// doubling any embedded quotes. Other fields are written as-is.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Header row plus one row per record, rows joined by `\n`.
pub fn to_csv(records: &[AnimeRecord]) -> String {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(HEADERS.join(","));

    for record in records {
        let fields = [
            record.title.clone(),
            record.summary.clone(),
            record.categories_joined(),
            record.regional_availability.clone(),
            record.community_sentiment.clone(),
            record.file_name.clone(),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        rows.push(row.join(","));
    }

    rows.join("\n")
}

/// Writes `records` as CSV to `path`, creating missing parent directories.
pub fn write_csv(records: &[AnimeRecord], path: &Path) -> Result<PathBuf, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ExportError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(path, to_csv(records)).map_err(|e| ExportError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    log::info!(
        "Exported {} records to {}",
        records.len(),
        crate::sanitize::redact_path(path)
    );
    Ok(path.to_path_buf())
}
