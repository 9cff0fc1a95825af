//! Embedding Proxy Server Configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub upstream: UpstreamConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub http_bind_address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Embeddings API base URL
    pub base_url: String,

    /// Model id sent with every request unless the caller overrides it
    pub model: String,

    /// Environment variable holding the bearer credential
    pub api_key_env: String,

    /// Timeout applied to each outbound call
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: ServerConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load from file, falling back to defaults when the file is absent
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self
            .network
            .http_bind_address
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(format!(
                "Invalid bind address '{}'",
                self.network.http_bind_address
            ));
        }

        if self.upstream.base_url.is_empty() {
            return Err("Upstream base_url cannot be empty".to_string());
        }

        if self.upstream.model.is_empty() {
            return Err("Upstream model cannot be empty".to_string());
        }

        if self.upstream.api_key_env.is_empty() {
            return Err("Upstream api_key_env cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                http_bind_address: "0.0.0.0:8699".to_string(),
            },
            upstream: UpstreamConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "text-embedding-3-small".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                request_timeout_secs: 30,
            },
            monitoring: MonitoringConfig {
                log_level: "info".to_string(),
            },
        }
    }
}
