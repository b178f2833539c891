//! Scripted catalog for driving the batch without a network.
//!
//! Identification replies are keyed by the image bytes, enrichment replies
//! by title. Raw reply text goes through the same parsers the Gemini client
//! uses, so sentinel handling and validation behave as in production.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use anime_lens::catalog::parse::{parse_details, parse_label};
use anime_lens::{AnimeCatalog, AnimeDetails, CatalogError, ImagePayload};

/// What the catalog answers for one call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Raw model text, parsed like a real reply.
    Text(String),
    /// An HTTP failure with the given status.
    Api(u16),
    /// Never resolves; only cancellation ends the call.
    Hang,
}

#[derive(Default)]
pub struct ScriptedCatalog {
    labels: HashMap<Vec<u8>, Reply>,
    details: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers identification of an image whose bytes are `image` with `reply`.
    pub fn identify_as(mut self, image: &str, reply: Reply) -> Self {
        self.labels.insert(image.as_bytes().to_vec(), reply);
        self
    }

    pub fn enrich_as(mut self, title: &str, reply: Reply) -> Self {
        self.details.insert(title.to_string(), reply);
        self
    }

    /// Shortcut: `image` is identified as `title` and enriched with a
    /// well-formed reply.
    pub fn knows(self, image: &str, title: &str) -> Self {
        self.identify_as(image, Reply::Text(title.to_string()))
            .enrich_as(title, Reply::Text(details_json(title)))
    }

    /// Calls made so far, as `identify:<image>` or `enrich:<title>`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

/// A fenced JSON enrichment reply with every field filled in.
pub fn details_json(title: &str) -> String {
    format!(
        "Here is what I found:\n```json\n{}\n```",
        serde_json::json!({
            "animeName": title,
            "plotSummary": format!("The story of {}.", title),
            "animeType": ["Action", "Adventure"],
            "streamingPlatformCanada": "Crunchyroll",
            "redditRating": "Generally Positive"
        })
    )
}

async fn resolve<T>(
    reply: Option<Reply>,
    parse: impl FnOnce(&str) -> Result<T, CatalogError>,
) -> Result<T, CatalogError> {
    match reply {
        Some(Reply::Text(text)) => parse(&text),
        Some(Reply::Api(status)) => Err(CatalogError::Api {
            status,
            body: "scripted failure".to_string(),
        }),
        Some(Reply::Hang) => std::future::pending().await,
        None => Err(CatalogError::EmptyResponse),
    }
}

#[async_trait]
impl AnimeCatalog for ScriptedCatalog {
    async fn identify(&self, image: &ImagePayload) -> Result<String, CatalogError> {
        self.record(format!("identify:{}", String::from_utf8_lossy(&image.bytes)));
        resolve(self.labels.get(&image.bytes).cloned(), parse_label).await
    }

    async fn enrich(&self, title: &str) -> Result<AnimeDetails, CatalogError> {
        self.record(format!("enrich:{}", title));
        resolve(self.details.get(title).cloned(), parse_details).await
    }
}
