//! Text encoder backed by an OpenAI-compatible embeddings API.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::encoder::Encoder;
use crate::error::{RecoError, Result};
use crate::space::TEXT_EMBEDDING_DIM;

/// The default embeddings API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// The default embedding model.
const DEFAULT_MODEL: &str = "text-embedding-3-small";

const PROVIDER: &str = "OpenAI";

/// An [`Encoder`] calling the `/embeddings` endpoint of an OpenAI-compatible
/// server.
///
/// The text space of the content collection is 384-dimensional, so requests
/// ask for that size by default. Point `base_url` at a self-hosted server to
/// use the same sentence-transformer model the catalogue was indexed with.
///
/// # Example
///
/// ```rust,ignore
/// use academy_reco::openai::OpenAiTextEncoder;
///
/// let encoder = OpenAiTextEncoder::from_env()?.with_base_url("http://embeddings:8080/v1");
/// let embedding = encoder.encode_text("Python").await?;
/// ```
pub struct OpenAiTextEncoder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OpenAiTextEncoder {
    /// Create a new encoder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RecoError::encoder(PROVIDER, "API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            dimensions: TEXT_EMBEDDING_DIM,
        })
    }

    /// Create a new encoder using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| RecoError::encoder(PROVIDER, "OPENAI_API_KEY environment variable not set"))?;
        Self::new(api_key)
    }

    /// Set the API base URL (without the trailing `/embeddings`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the requested output dimensions.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }
}

// ── Wire format ────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<Embedding>,
}

#[derive(Deserialize)]
struct Embedding {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Deserialize)]
struct ApiErrorMessage {
    message: String,
}

impl OpenAiTextEncoder {
    /// Turn a non-success response into an encoder error, preferring the
    /// API's own message over the raw body.
    async fn api_error(response: reqwest::Response) -> RecoError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) => parsed.error.message,
            Err(_) => body,
        };
        error!(provider = PROVIDER, %status, "embeddings API error");
        RecoError::encoder(PROVIDER, format!("API returned {status}: {detail}"))
    }
}

// ── Encoder implementation ─────────────────────────────────────────

#[async_trait]
impl Encoder for OpenAiTextEncoder {
    async fn encode_text(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), model = %self.model, "encoding text");

        let body = EmbeddingsRequest { model: &self.model, input: [text], dimensions: self.dimensions };
        let response = match self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => return Err(Self::api_error(response).await),
            Err(e) => {
                error!(provider = PROVIDER, error = %e, "embeddings request failed");
                return Err(RecoError::encoder(PROVIDER, format!("request failed: {e}")));
            }
        };

        let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
            RecoError::encoder(PROVIDER, format!("unreadable embeddings response: {e}"))
        })?;
        match parsed.data.into_iter().next() {
            Some(first) => Ok(first.embedding),
            None => Err(RecoError::encoder(PROVIDER, "API returned no embedding")),
        }
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
