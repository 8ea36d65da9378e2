//! Schema registry clients
//!
//! The encoder never stores schema ids itself. It asks a
//! [`SchemaRegistryClient`] to register the schema of every outgoing value and
//! to resolve the id of every incoming frame, and relies on the client for
//! caching:
//!
//! - [`MemoryRegistry`]: in-process registry for tests and single-process use
//! - [`CachedSchemaRegistryClient`]: Confluent-compatible HTTP registry with
//!   local caches, so that steady-state traffic makes no HTTP calls
//!
//! Both calls may block on I/O and may fail. Timeouts are the client's
//! concern; whatever error it raises reaches the encoder's caller unchanged.

mod http;
mod memory;

pub use http::CachedSchemaRegistryClient;
pub use memory::MemoryRegistry;

use crate::error::RegistryResult;
use crate::types::SchemaId;
use apache_avro::Schema;
use async_trait::async_trait;
use std::sync::Arc;

/// Registry capability used by the encoder
#[async_trait]
pub trait SchemaRegistryClient: Send + Sync {
    /// Register `schema` under `subject`, returning its id
    ///
    /// Registering an already known schema returns the existing id.
    async fn register(&self, subject: &str, schema: &Schema) -> RegistryResult<SchemaId>;

    /// Resolve an id to its schema
    async fn get_by_id(&self, id: SchemaId) -> RegistryResult<Arc<Schema>>;
}
