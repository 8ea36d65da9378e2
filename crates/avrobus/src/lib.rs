//! # avrobus
//!
//! Avro message codec for pub/sub clients, coordinated with a
//! Confluent-compatible schema registry so that only a schema id, never the
//! schema text, travels with each message.
//!
//! ## Wire Format
//!
//! ```text
//! [0x00][schema_id: 4 bytes big-endian][avro binary body]
//! ```
//!
//! This is the framing written by Confluent serializers, so frames are
//! interchangeable with Kafka producers and consumers using them.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  MessageCodec / CodecRegistry   (plug-in for a messaging  │
//! │                                  client: encode/decode)    │
//! ├───────────────────────────────────────────────────────────┤
//! │  AvroEncoder                                              │
//! │  ├── SchemaResolver   value kind -> schema                │
//! │  ├── frame            magic byte + schema id header       │
//! │  └── BufferPool       reusable scratch buffers            │
//! ├───────────────────────────────────────────────────────────┤
//! │  SchemaRegistryClient                                     │
//! │  ├── MemoryRegistry              (tests, single process)  │
//! │  └── CachedSchemaRegistryClient  (HTTP, cached)           │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use avrobus::{AvroEncoder, Datum};
//!
//! let encoder = AvroEncoder::connect("http://localhost:8081")?;
//!
//! let bytes = encoder.encode("metrics", Some(Datum::from(42i64))).await?;
//!
//! let mut value = apache_avro::types::Value::Null;
//! encoder.decode("metrics", bytes.as_deref(), &mut value).await?;
//! ```
//!
//! Records carry their own schema by implementing [`AvroRecord`] and go
//! through [`AvroEncoder::encode_record`] / [`AvroEncoder::decode_into`].
//!
//! ## Supported Values
//!
//! Null, boolean, int, long, float, double, string and bytes use built-in
//! schemas; anything else must be self-describing. Encoding any other value
//! panics: it is a bug at the call site, not a data error.

pub mod buffer_pool;
pub mod codec;
pub mod config;
pub mod encoder;
pub mod error;
pub mod fingerprint;
pub mod frame;
pub mod registry;
pub mod resolver;
pub mod types;

pub use buffer_pool::{BufferPool, BufferPoolConfig, PoolStats, PooledBuffer};
pub use codec::{CodecRegistry, MessageCodec};
pub use config::{EncoderConfig, RegistryConfig};
pub use encoder::AvroEncoder;
pub use error::{error_codes, CodecError, CodecResult, RegistryError, RegistryResult};
pub use fingerprint::SchemaFingerprint;
pub use frame::{HEADER_LEN, MAGIC_BYTE};
pub use registry::{CachedSchemaRegistryClient, MemoryRegistry, SchemaRegistryClient};
pub use resolver::{AvroRecord, Datum, PrimitiveKind, PrimitiveSchemas, SchemaResolver};
pub use types::SchemaId;

// Values and schemas in the public API are apache-avro types.
pub use apache_avro;
