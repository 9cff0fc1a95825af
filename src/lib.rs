//! Embedding Proxy Library
//!
//! HTTP pass-through service: accepts a text payload, forwards it to an
//! upstream embeddings API, and returns the resulting vector

pub mod protocol;
pub mod server;
pub mod upstream;

// Re-exports
pub use protocol::http::{HttpEmbedRequest, HttpEmbedResponse};
pub use server::{start_http_server, ServerConfig};
pub use upstream::{Embedding, EmbeddingsClient, UpstreamError};
