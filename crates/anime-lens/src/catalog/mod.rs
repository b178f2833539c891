//! Identification and enrichment against an external model.
//!
//! [`AnimeCatalog`] is the seam the batch orchestrator talks to: one call
//! turns a screenshot into a title, a second turns the title into
//! descriptive fields. [`GeminiClient`] is the production implementation.

pub mod error;
pub mod gemini;
pub mod parse;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::CatalogError;
pub use gemini::GeminiClient;

/// Image content handed to the identification call.
#[derive(Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("bytes.len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Validated enrichment result. Every field is present; `categories` is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDetails {
    /// Canonical name, which may differ from the identification guess.
    pub title: String,
    pub summary: String,
    pub categories: Vec<String>,
    /// Where the show streams in Canada, or `Not found`.
    pub regional_availability: String,
    pub community_sentiment: String,
}

#[async_trait]
pub trait AnimeCatalog: Send + Sync {
    /// Names the anime in `image`. [`CatalogError::Unidentified`] when the
    /// model cannot tell.
    async fn identify(&self, image: &ImagePayload) -> Result<String, CatalogError>;

    /// Looks up descriptive fields for `title`.
    async fn enrich(&self, title: &str) -> Result<AnimeDetails, CatalogError>;
}

#[async_trait]
impl<T: AnimeCatalog + ?Sized> AnimeCatalog for Arc<T> {
    async fn identify(&self, image: &ImagePayload) -> Result<String, CatalogError> {
        (**self).identify(image).await
    }

    async fn enrich(&self, title: &str) -> Result<AnimeDetails, CatalogError> {
        (**self).enrich(title).await
    }
}
