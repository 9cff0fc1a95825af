//! OpenAI-compatible embeddings client
//!
//! Issues one POST to {base_url}/embeddings per call and parses the
//! response into a typed shape before indexing into it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::server::config::UpstreamConfig;
use crate::upstream::{Embedding, UpstreamError, UpstreamResult};

/// Client for the upstream embeddings endpoint
pub struct EmbeddingsClient {
    /// Bearer credential, resolved once at construction
    api_key: Option<String>,

    /// Name of the environment variable the credential is read from
    api_key_env: String,

    /// API base URL, e.g. https://api.openai.com/v1
    base_url: String,

    /// Model id sent when the request carries no override
    model: String,

    /// HTTP client
    client: reqwest::Client,
}

impl EmbeddingsClient {
    /// Create a client from the upstream configuration
    ///
    /// The credential is read from the configured environment variable here,
    /// not per call. An absent credential is not fatal at construction; it
    /// surfaces as `MissingCredential` on each embed call and in /health.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            api_key: std::env::var(&config.api_key_env).ok(),
            api_key_env: config.api_key_env.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        })
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Get the configured default model id
    pub fn default_model(&self) -> &str {
        &self.model
    }

    /// Embedding dimension declared by the configured model
    pub fn model_dimension(&self) -> usize {
        match self.model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        }
    }

    /// Check if a credential is present
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate an embedding for the given text
    ///
    /// Sends {"input": text, "model": model} with a bearer credential and
    /// returns the first vector from the response's `data` array.
    pub async fn embed(&self, text: &str, model: Option<&str>) -> UpstreamResult<Embedding> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| UpstreamError::MissingCredential {
                env_var: self.api_key_env.clone(),
            })?;

        let model = model.unwrap_or(&self.model);

        debug!("Generating embedding with model: {model}");

        let body = EmbeddingsApiRequest { input: text, model };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::ApiRequest { status, message });
        }

        let payload = response.text().await?;
        let result: EmbeddingsApiResponse =
            serde_json::from_str(&payload).map_err(|e| UpstreamError::InvalidResponse {
                message: e.to_string(),
            })?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::InvalidResponse {
                message: "empty data array in response".to_string(),
            })?
            .embedding;

        debug!("Generated embedding with {} dimensions", embedding.len());

        Ok(embedding)
    }
}

/// Upstream API request body
#[derive(Debug, Serialize)]
struct EmbeddingsApiRequest<'a> {
    input: &'a str,
    model: &'a str,
}

/// Upstream API response format
#[derive(Debug, Deserialize)]
struct EmbeddingsApiResponse {
    data: Vec<EmbeddingsApiData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsApiData {
    embedding: Vec<f32>,
}
