use thiserror::Error;

/// Failures of a single identification or enrichment call.
///
/// These never abort a batch: the orchestrator records them on the item
/// that produced them and moves on.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Could not identify the anime from the image")]
    Unidentified,

    #[error("Failed to read image: {0}")]
    ImageRead(#[source] std::io::Error),

    #[error("Request to the model failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Failed to get valid structured data from the web search: {0}")]
    InvalidResponse(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}

impl CatalogError {
    /// True when the reply arrived but did not meet the expected shape.
    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::InvalidResponse(_) | CatalogError::EmptyResponse)
    }
}
