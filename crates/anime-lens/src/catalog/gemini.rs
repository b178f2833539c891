//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn, Instrument};

use super::error::CatalogError;
use super::parse::{parse_details, parse_label};
use super::prompt::{enrichment_prompt, IDENTIFY_INSTRUCTION};
use super::{AnimeCatalog, AnimeDetails, ImagePayload};
use crate::config::{Config, GeminiConfig};
use crate::error::AnimeLensError;
use crate::sanitize;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

// Parts may also carry function calls or grounding data; only text matters here.
#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentRequest {
    pub(crate) fn identify(image: &ImagePayload) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: IDENTIFY_INSTRUCTION.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: BASE64.encode(&image.bytes),
                        },
                    },
                ],
            }],
            tools: Vec::new(),
        }
    }

    pub(crate) fn enrich(title: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: enrichment_prompt(title),
                }],
            }],
            tools: vec![Tool {
                google_search: serde_json::Map::new(),
            }],
        }
    }
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub(crate) fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// [`AnimeCatalog`] backed by the Gemini REST API.
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, api_key: SecretString) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CatalogError::HttpClient(e.to_string()))?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            http,
            endpoint,
            model: config.model.clone(),
            api_key,
        })
    }

    /// Builds a client from the full config. Fails fast when no API key can
    /// be resolved, before any request is attempted.
    pub fn from_config(config: &Config) -> Result<Self, AnimeLensError> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(&config.gemini, api_key)?)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateContentRequest) -> Result<String, CatalogError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = sanitize::truncate_for_log(&body);
            warn!(status = status.as_u16(), "Gemini request rejected: {}", body);
            return Err(CatalogError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.text().ok_or(CatalogError::EmptyResponse)?;
        debug!("Gemini reply: {}", sanitize::truncate_for_log(&text));
        Ok(text)
    }
}

#[async_trait]
impl AnimeCatalog for GeminiClient {
    async fn identify(&self, image: &ImagePayload) -> Result<String, CatalogError> {
        let request = GenerateContentRequest::identify(image);
        let reply = self
            .generate(&request)
            .instrument(info_span!("gemini.identify", model = %self.model))
            .await?;
        parse_label(&reply)
    }

    async fn enrich(&self, title: &str) -> Result<AnimeDetails, CatalogError> {
        let request = GenerateContentRequest::enrich(title);
        let reply = self
            .generate(&request)
            .instrument(info_span!("gemini.enrich", model = %self.model, title = %title))
            .await?;
        parse_details(&reply).inspect_err(|e| {
            warn!("Rejected enrichment reply for '{}': {}", title, e);
        })
    }
}
