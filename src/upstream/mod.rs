//! Upstream embeddings provider
//!
//! Client for the third-party embeddings API the proxy delegates to.
//! One inbound request maps to exactly one outbound call here.

pub mod client;

// Re-exports
pub use client::EmbeddingsClient;

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Result type for upstream operations
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Errors that can occur talking to the upstream provider
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream credential missing: {env_var} is not set")]
    MissingCredential { env_var: String },

    #[error("upstream request failed with status {status}: {message}")]
    ApiRequest { status: u16, message: String },

    #[error("upstream response malformed: {message}")]
    InvalidResponse { message: String },

    #[error("http error: {error}")]
    Http { error: reqwest::Error },
}

impl From<reqwest::Error> for UpstreamError {
    fn from(error: reqwest::Error) -> Self {
        UpstreamError::Http { error }
    }
}
