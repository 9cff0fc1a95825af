//! HTTP REST API Protocol
//!
//! JSON bodies for the proxy endpoints:
//! - Request body: {"text": "...", "model": "..." (optional)}
//! - Response body: {"embedding": [0.1, 0.2, 0.3, ...]}

use serde::{Deserialize, Serialize};

/// HTTP Embedding Request
///
/// Callers send:
/// - text: The text to embed (required)
/// - model: Optional override of the configured upstream model id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpEmbedRequest {
    /// Text to embed
    pub text: String,

    /// Optional model override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// HTTP Embedding Response
///
/// Callers receive: {"embedding": [0.1, 0.2, 0.3, ...]}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpEmbedResponse {
    /// The embedding vector
    pub embedding: Vec<f32>,
}

impl HttpEmbedResponse {
    /// Create a new response
    pub fn new(embedding: Vec<f32>) -> Self {
        Self { embedding }
    }
}

/// HTTP Error Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error message
    pub error: String,

    /// Error code (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Additional details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            details: None,
        }
    }

    /// Create error with code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Create error with details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Create invalid JSON error
    pub fn invalid_json() -> Self {
        Self {
            error: "Request body is not valid JSON with a 'text' field".to_string(),
            code: Some("INVALID_JSON".to_string()),
            details: None,
        }
    }

    /// Create missing credential error
    pub fn credential_missing(env_var: &str) -> Self {
        Self {
            error: format!("Upstream credential missing: {} is not set", env_var),
            code: Some("CREDENTIAL_MISSING".to_string()),
            details: None,
        }
    }

    /// Create upstream failure error
    pub fn upstream_error(details: impl Into<String>) -> Self {
        Self {
            error: "Upstream embeddings call failed".to_string(),
            code: Some("UPSTREAM_ERROR".to_string()),
            details: Some(details.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub version: String,
    pub embedding_dimension: usize,
}

impl HealthResponse {
    pub fn healthy(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            model: model.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            embedding_dimension: dimension,
        }
    }
}
