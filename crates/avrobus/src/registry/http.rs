//! Confluent-compatible HTTP registry client with local caches
//!
//! Talks to any registry implementing the Confluent REST API (Confluent Schema
//! Registry, Apicurio, Karapace):
//!
//! - `POST /subjects/{subject}/versions` registers a schema and returns its id
//! - `GET /schemas/ids/{id}` returns the schema for an id
//!
//! Successful answers are cached for the lifetime of the client, so each
//! (subject, schema) pair and each id costs at most one round trip.

use super::SchemaRegistryClient;
use crate::config::RegistryConfig;
use crate::error::{error_codes, RegistryError, RegistryResult};
use crate::fingerprint::SchemaFingerprint;
use crate::types::SchemaId;
use apache_avro::Schema;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Request body for registering a schema
#[derive(Debug, Serialize)]
struct RegisterSchemaRequest {
    schema: String,
}

/// Response from schema registration
#[derive(Debug, Deserialize)]
struct RegisterSchemaResponse {
    id: i32,
}

/// Response from getting a schema by ID
#[derive(Debug, Deserialize)]
struct GetSchemaResponse {
    schema: String,
}

/// Confluent error body
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error_code: Option<u32>,
    message: Option<String>,
}

/// Cached HTTP schema registry client
pub struct CachedSchemaRegistryClient {
    client: Client,
    base_url: Url,
    /// Cache: (subject, fingerprint) -> id
    id_cache: RwLock<HashMap<(String, SchemaFingerprint), SchemaId>>,
    /// Cache: id -> schema
    schema_cache: RwLock<HashMap<SchemaId, Arc<Schema>>>,
}

impl CachedSchemaRegistryClient {
    /// Client for the registry at `url` with default settings
    pub fn new(url: impl Into<String>) -> RegistryResult<Self> {
        Self::from_config(&RegistryConfig::new(url))
    }

    pub fn from_config(config: &RegistryConfig) -> RegistryResult<Self> {
        let mut client_builder =
            Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let Some(username) = &config.username {
            use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

            let credentials = format!(
                "{}:{}",
                username,
                config.password.as_deref().unwrap_or_default()
            );
            let auth_value = format!("Basic {}", base64_encode(credentials.as_bytes()));

            let mut value = HeaderValue::from_str(&auth_value)
                .map_err(|e| RegistryError::Config(e.to_string()))?;
            value.set_sensitive(true);

            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, value);
            client_builder = client_builder.default_headers(headers);
        }

        let client = client_builder
            .build()
            .map_err(|e| RegistryError::Config(e.to_string()))?;

        let base_url = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|e| RegistryError::Config(format!("invalid registry url {}: {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RegistryError::Config(format!(
                "invalid registry url {}",
                config.url
            )));
        }

        Ok(Self {
            client,
            base_url,
            id_cache: RwLock::new(HashMap::new()),
            schema_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Number of cached id -> schema entries
    pub fn cached_schemas(&self) -> usize {
        self.schema_cache.read().len()
    }

    /// Forget everything learned from the registry
    pub fn clear_cache(&self) {
        self.id_cache.write().clear();
        self.schema_cache.write().clear();
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `from_config` rejects cannot-be-a-base urls
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn fetch_schema(&self, id: SchemaId) -> RegistryResult<Schema> {
        let url = self.endpoint(&["schemas", "ids", &id.to_string()]);

        let response = self
            .client
            .get(url)
            .header("Accept", CONTENT_TYPE)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status, &body, Some(id)));
        }

        let result: GetSchemaResponse = response.json().await?;
        Schema::parse_str(&result.schema).map_err(|e| {
            RegistryError::InvalidSchema(format!("schema {} from registry: {}", id, e))
        })
    }
}

#[async_trait]
impl SchemaRegistryClient for CachedSchemaRegistryClient {
    async fn register(&self, subject: &str, schema: &Schema) -> RegistryResult<SchemaId> {
        let fingerprint = SchemaFingerprint::compute(schema);
        let key = (subject.to_string(), fingerprint);
        let cached = self.id_cache.read().get(&key).copied();
        if let Some(id) = cached {
            return Ok(id);
        }

        let schema_json = serde_json::to_string(schema)
            .map_err(|e| RegistryError::InvalidSchema(e.to_string()))?;
        let url = self.endpoint(&["subjects", subject, "versions"]);

        let response = self
            .client
            .post(url)
            .header("Content-Type", CONTENT_TYPE)
            .header("Accept", CONTENT_TYPE)
            .json(&RegisterSchemaRequest {
                schema: schema_json,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status, &body, None));
        }

        let result: RegisterSchemaResponse = response.json().await?;
        let id = SchemaId::new(result.id);

        self.id_cache.write().insert(key, id);
        self.schema_cache
            .write()
            .entry(id)
            .or_insert_with(|| Arc::new(schema.clone()));

        tracing::info!(
            subject = %subject,
            schema_id = %id,
            "Registered schema with external registry"
        );

        Ok(id)
    }

    async fn get_by_id(&self, id: SchemaId) -> RegistryResult<Arc<Schema>> {
        let cached = self.schema_cache.read().get(&id).cloned();
        if let Some(schema) = cached {
            return Ok(schema);
        }

        let schema = Arc::new(self.fetch_schema(id).await?);
        tracing::debug!(schema_id = %id, "Fetched schema from external registry");

        let mut cache = self.schema_cache.write();
        Ok(Arc::clone(cache.entry(id).or_insert(schema)))
    }
}

impl std::fmt::Debug for CachedSchemaRegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedSchemaRegistryClient")
            .field("base_url", &self.base_url.as_str())
            .field("cached_schemas", &self.cached_schemas())
            .finish()
    }
}

/// Map a non-success registry response to an error
fn parse_error(status: StatusCode, body: &str, id: Option<SchemaId>) -> RegistryError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let error_code = parsed.as_ref().and_then(|e| e.error_code);
    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    match (error_code, id) {
        (Some(error_codes::SCHEMA_NOT_FOUND), Some(id)) => RegistryError::SchemaNotFound(id),
        (None, Some(id)) if status == StatusCode::NOT_FOUND => RegistryError::SchemaNotFound(id),
        (Some(error_codes::SUBJECT_NOT_FOUND), _) => RegistryError::SubjectNotFound(message),
        (Some(error_codes::INCOMPATIBLE_SCHEMA), _) => RegistryError::IncompatibleSchema(message),
        (Some(error_codes::INVALID_SCHEMA), _) => RegistryError::InvalidSchema(message),
        _ => RegistryError::Server {
            status: status.as_u16(),
            error_code,
            message,
        },
    }
}

fn base64_encode(input: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(input)
}
