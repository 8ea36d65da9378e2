//! Registry-aware Avro frame codec
//!
//! Encode:
//!
//! ```text
//! value ─► resolve schema ─► registry.register(subject, schema) ─► id
//!       ─► [0x00][id BE][avro body] in a pooled scratch buffer ─► Bytes
//! ```
//!
//! Decode:
//!
//! ```text
//! bytes ─► check magic ─► read id ─► registry.get_by_id(id) ─► schema
//!       ─► avro body ─► target
//! ```
//!
//! Absent input is a no-op in both directions: encoding `None` yields no
//! bytes and decoding `None` leaves the target untouched. An explicit Avro
//! null is framed and registered like any other value.

use crate::buffer_pool::{BufferPool, BufferPoolConfig};
use crate::config::EncoderConfig;
use crate::error::{CodecResult, RegistryResult};
use crate::frame;
use crate::registry::{CachedSchemaRegistryClient, SchemaRegistryClient};
use crate::resolver::{AvroRecord, Datum, SchemaResolver};
use crate::types::SchemaId;
use apache_avro::types::Value;
use apache_avro::{from_avro_datum, to_avro_datum, Schema};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Avro codec that frames values with their registry schema id
///
/// One instance is meant to be shared by every publisher and subscriber of a
/// connection; all methods take `&self` and may run concurrently.
pub struct AvroEncoder {
    resolver: SchemaResolver,
    registry: Arc<dyn SchemaRegistryClient>,
    buffers: Arc<BufferPool>,
}

impl AvroEncoder {
    /// Encoder over `registry` with a default buffer pool
    pub fn new(registry: Arc<dyn SchemaRegistryClient>) -> Self {
        Self::with_buffer_pool(registry, BufferPoolConfig::default())
    }

    pub fn with_buffer_pool(
        registry: Arc<dyn SchemaRegistryClient>,
        buffer_pool: BufferPoolConfig,
    ) -> Self {
        Self {
            resolver: SchemaResolver::new(),
            registry,
            buffers: BufferPool::new(buffer_pool),
        }
    }

    /// Encoder backed by a cached HTTP registry at `url`
    pub fn connect(url: impl Into<String>) -> RegistryResult<Self> {
        Self::from_config(&EncoderConfig::new(url))
    }

    pub fn from_config(config: &EncoderConfig) -> RegistryResult<Self> {
        let registry = CachedSchemaRegistryClient::from_config(&config.registry)?;
        Ok(Self::with_buffer_pool(
            Arc::new(registry),
            config.buffer_pool.clone(),
        ))
    }

    pub fn registry(&self) -> &Arc<dyn SchemaRegistryClient> {
        &self.registry
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffers
    }

    /// Schema that `encode` would register for `datum`
    ///
    /// # Panics
    ///
    /// Panics for values of unsupported kinds, see [`SchemaResolver::resolve`].
    pub fn schema_for<'a>(&'a self, datum: &Datum<'a>) -> &'a Schema {
        self.resolver.resolve(datum)
    }

    /// Encode `value` as a frame registered under `subject`
    ///
    /// Returns `Ok(None)` when `value` is `None`. On error no bytes are
    /// returned and the scratch buffer is back in the pool.
    ///
    /// # Panics
    ///
    /// Panics for values of unsupported kinds, see [`SchemaResolver::resolve`].
    pub async fn encode(&self, subject: &str, value: Option<Datum<'_>>) -> CodecResult<Option<Bytes>> {
        let Some(datum) = value else {
            return Ok(None);
        };

        let schema = self.resolver.resolve(&datum);
        let id = self.registry.register(subject, schema).await?;

        self.write_frame(id, schema, datum.into_value()).map(Some)
    }

    /// Encode a typed self-describing record
    pub async fn encode_record<R>(&self, subject: &str, record: Option<&R>) -> CodecResult<Option<Bytes>>
    where
        R: AvroRecord + Sync + ?Sized,
    {
        let datum = record.map(Datum::from_record).transpose()?;
        self.encode(subject, datum).await
    }

    fn write_frame(&self, id: SchemaId, schema: &Schema, value: Value) -> CodecResult<Bytes> {
        let mut buf = self.buffers.acquire();
        frame::write_header(&mut *buf, id);

        // Plain values against a union schema carry no branch index until resolved
        let value = value.resolve(schema)?;
        let body = to_avro_datum(schema, value)?;
        buf.extend_from_slice(&body);

        Ok(Bytes::copy_from_slice(&buf))
    }

    /// Decode a frame into `target`
    ///
    /// `subject` is accepted for symmetry with [`encode`](Self::encode); the
    /// schema id inside the frame is enough to find the schema. When `data` is
    /// `None` this is a no-op. `target` is only assigned once the whole body
    /// decoded successfully.
    pub async fn decode(&self, subject: &str, data: Option<&[u8]>, target: &mut Value) -> CodecResult<()> {
        if let Some(value) = self.decode_value(subject, data).await? {
            *target = value;
        }
        Ok(())
    }

    /// Decode a frame into a typed value through serde
    ///
    /// Avro `bytes` deserialize only into byte-buffer types: use
    /// `serde_bytes::ByteBuf`, or `#[serde(with = "serde_bytes")]` on a
    /// `Vec<u8>` field. A bare `Vec<u8>` target expects an Avro array.
    pub async fn decode_into<T>(&self, subject: &str, data: Option<&[u8]>, target: &mut T) -> CodecResult<()>
    where
        T: DeserializeOwned,
    {
        if let Some(value) = self.decode_value(subject, data).await? {
            *target = apache_avro::from_value::<T>(&value)?;
        }
        Ok(())
    }

    /// Decode a frame into a fresh value, `None` when `data` is `None`
    pub async fn decode_value(&self, subject: &str, data: Option<&[u8]>) -> CodecResult<Option<Value>> {
        let Some(data) = data else {
            return Ok(None);
        };

        let (id, mut body) = frame::parse_header(data).inspect_err(|e| {
            tracing::warn!(subject = %subject, error = %e, "Rejected malformed frame");
        })?;

        let schema = self.registry.get_by_id(id).await?;
        tracing::trace!(subject = %subject, schema_id = %id, "Decoding frame body");

        let value = from_avro_datum(&schema, &mut body, None)?;
        Ok(Some(value))
    }
}

impl std::fmt::Debug for AvroEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvroEncoder")
            .field("buffers", &self.buffers)
            .finish_non_exhaustive()
    }
}
