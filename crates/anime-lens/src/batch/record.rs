use serde::Serialize;

use super::item::{ItemId, WorkItem};
use crate::catalog::AnimeDetails;

/// Result for one completed item. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeRecord {
    /// Join key back to the work item.
    pub item_id: ItemId,
    /// Name of the screenshot, exported as "Original File".
    pub file_name: String,
    pub title: String,
    pub summary: String,
    pub categories: Vec<String>,
    pub regional_availability: String,
    pub community_sentiment: String,
}

impl AnimeRecord {
    pub fn new(item: &WorkItem, details: AnimeDetails) -> Self {
        Self {
            item_id: item.id,
            file_name: item.file_name().to_string(),
            title: details.title,
            summary: details.summary,
            categories: details.categories,
            regional_availability: details.regional_availability,
            community_sentiment: details.community_sentiment,
        }
    }

    /// Categories as a single comma-separated string.
    pub fn categories_joined(&self) -> String {
        self.categories.join(", ")
    }
}
