//! Encoder configuration
//!
//! All structs deserialize with serde so hosts can embed them in their own
//! configuration files:
//!
//! ```yaml
//! registry:
//!   url: http://localhost:8081
//!   timeout_secs: 10
//! buffer_pool:
//!   pool_size: 1024
//! ```

pub use crate::buffer_pool::BufferPoolConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the HTTP schema registry client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the Confluent-compatible registry
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Basic auth user
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl RegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
            username: None,
            password: None,
        }
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Authenticate with HTTP basic auth
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Configuration for an [`AvroEncoder`](crate::AvroEncoder) backed by an HTTP registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub registry: RegistryConfig,

    #[serde(default)]
    pub buffer_pool: BufferPoolConfig,
}

impl EncoderConfig {
    pub fn new(registry_url: impl Into<String>) -> Self {
        Self {
            registry: RegistryConfig::new(registry_url),
            buffer_pool: BufferPoolConfig::default(),
        }
    }

    pub fn with_buffer_pool(mut self, buffer_pool: BufferPoolConfig) -> Self {
        self.buffer_pool = buffer_pool;
        self
    }
}
