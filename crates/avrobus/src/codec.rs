//! Plug-in surface for messaging clients
//!
//! A messaging client that wants to encode payloads transparently looks up a
//! [`MessageCodec`] by name and calls it on every publish and delivery:
//!
//! ```rust,ignore
//! let codecs = CodecRegistry::new();
//! codecs.register("avro", Arc::new(AvroEncoder::connect("http://localhost:8081")?));
//!
//! let codec = codecs.get("avro").expect("registered above");
//! let payload = codec.encode("metrics", Some(Datum::from(42i64))).await?;
//! ```

use crate::encoder::AvroEncoder;
use crate::error::CodecResult;
use crate::resolver::Datum;
use apache_avro::types::Value;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Two-method codec capability exposed to a messaging client
#[async_trait]
pub trait MessageCodec: Send + Sync {
    /// Short name, e.g. `"avro"`
    fn name(&self) -> &str;

    /// Encode `value` for `subject`; `None` in, `None` out
    async fn encode(&self, subject: &str, value: Option<Datum<'_>>) -> CodecResult<Option<Bytes>>;

    /// Decode `data` into `target`; `None` leaves `target` untouched
    async fn decode(&self, subject: &str, data: Option<&[u8]>, target: &mut Value) -> CodecResult<()>;
}

#[async_trait]
impl MessageCodec for AvroEncoder {
    fn name(&self) -> &str {
        "avro"
    }

    async fn encode(&self, subject: &str, value: Option<Datum<'_>>) -> CodecResult<Option<Bytes>> {
        AvroEncoder::encode(self, subject, value).await
    }

    async fn decode(&self, subject: &str, data: Option<&[u8]>, target: &mut Value) -> CodecResult<()> {
        AvroEncoder::decode(self, subject, data, target).await
    }
}

/// Named codecs available to a messaging client
#[derive(Default)]
pub struct CodecRegistry {
    codecs: RwLock<HashMap<String, Arc<dyn MessageCodec>>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `codec` under `name`, returning the codec it replaced
    pub fn register(
        &self,
        name: impl Into<String>,
        codec: Arc<dyn MessageCodec>,
    ) -> Option<Arc<dyn MessageCodec>> {
        let name = name.into();
        tracing::debug!(name = %name, codec = codec.name(), "Registered message codec");
        self.codecs.write().insert(name, codec)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MessageCodec>> {
        self.codecs.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn MessageCodec>> {
        self.codecs.write().remove(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.codecs.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.names())
            .finish()
    }
}
