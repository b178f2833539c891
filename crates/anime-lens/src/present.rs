//! Results table: a pure projection of batch state.

use std::collections::HashMap;
use std::fmt::Write;

use serde::Serialize;

use crate::batch::{AnimeRecord, ItemId, ItemStatus, WorkItem};

/// Shown in result columns until a record exists.
pub const PLACEHOLDER: &str = "...";

pub const EMPTY_TABLE_TEXT: &str = "Upload images and start processing to see results here.";

const HEADERS: [&str; 5] = [
    "File",
    "Status",
    "Anime Name",
    "Streaming (CA)",
    "Reddit Rating",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGlyph {
    Success,
    Failure,
    InProgress,
    Neutral,
}

impl StatusGlyph {
    pub fn for_status(status: ItemStatus) -> Self {
        match status {
            ItemStatus::Complete => StatusGlyph::Success,
            ItemStatus::Errored => StatusGlyph::Failure,
            ItemStatus::Identifying | ItemStatus::Searching => StatusGlyph::InProgress,
            ItemStatus::Pending | ItemStatus::Cancelled => StatusGlyph::Neutral,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            StatusGlyph::Success => '✔',
            StatusGlyph::Failure => '✘',
            StatusGlyph::InProgress => '…',
            StatusGlyph::Neutral => '·',
        }
    }
}

/// Record fields as displayed for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub title: String,
    pub categories: String,
    pub regional_availability: String,
    pub community_sentiment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub item_id: ItemId,
    pub file_name: String,
    pub glyph: StatusGlyph,
    pub status: ItemStatus,
    /// The item message when there is one, otherwise the status label.
    pub status_text: String,
    pub record: Option<RecordView>,
}

impl TableRow {
    fn cells(&self) -> [String; 5] {
        let (title, streaming, rating) = match &self.record {
            Some(r) => (
                r.title.as_str(),
                r.regional_availability.as_str(),
                r.community_sentiment.as_str(),
            ),
            None => (PLACEHOLDER, PLACEHOLDER, PLACEHOLDER),
        };
        [
            single_line(&self.file_name),
            format!("{} {}", self.glyph.symbol(), single_line(&self.status_text)),
            single_line(or_placeholder(title)),
            single_line(or_placeholder(streaming)),
            single_line(or_placeholder(rating)),
        ]
    }
}

/// One row per item, in item order, joined to records by item id.
pub fn project(items: &[WorkItem], records: &[AnimeRecord]) -> Vec<TableRow> {
    let by_item: HashMap<ItemId, &AnimeRecord> =
        records.iter().map(|r| (r.item_id, r)).collect();

    items
        .iter()
        .map(|item| TableRow {
            item_id: item.id,
            file_name: item.file_name().to_string(),
            glyph: StatusGlyph::for_status(item.status()),
            status: item.status(),
            status_text: item
                .message()
                .filter(|m| !m.is_empty())
                .unwrap_or(item.status().label())
                .to_string(),
            record: by_item.get(&item.id).map(|r| RecordView {
                title: r.title.clone(),
                categories: r.categories_joined(),
                regional_availability: r.regional_availability.clone(),
                community_sentiment: r.community_sentiment.clone(),
            }),
        })
        .collect()
}

/// Renders rows as an aligned plain-text table.
pub fn render_table(rows: &[TableRow]) -> String {
    if rows.is_empty() {
        return format!("{}\n", EMPTY_TABLE_TEXT);
    }

    let cells: Vec<[String; 5]> = rows.iter().map(TableRow::cells).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_line(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &cells {
        write_line(&mut out, row, &widths);
    }
    out
}

fn write_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width - cell.chars().count();
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        PLACEHOLDER
    } else {
        value
    }
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
