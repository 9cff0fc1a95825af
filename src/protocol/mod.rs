//! Wire types for the embedding proxy
//!
//! The proxy speaks plain JSON over HTTP:
//! - Endpoint: POST /embed
//! - Request body: {"text": "..."}
//! - Response body: {"embedding": [0.1, 0.2, 0.3, ...]}

pub mod http;

pub use http::{HttpEmbedRequest, HttpEmbedResponse};
