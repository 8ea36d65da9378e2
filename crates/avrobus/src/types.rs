//! Core identifiers shared by the encoder and the registry clients

use serde::{Deserialize, Serialize};

/// Registry-assigned identifier of a schema
///
/// Identifiers are global across subjects: registering the same schema under
/// two subjects yields the same id. On the wire the id is written as a
/// big-endian two's complement `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaId(pub i32);

impl SchemaId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// Big-endian wire representation
    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(i32::from_be_bytes(bytes))
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for SchemaId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Subject naming helpers
///
/// Subjects are opaque registry keys; the encoder never interprets them. These
/// helpers only build the conventional `{topic}-key` / `{topic}-value` names.
pub mod subject {
    /// Subject for the key of messages on `topic`
    pub fn key(topic: &str) -> String {
        format!("{}-key", topic)
    }

    /// Subject for the value of messages on `topic`
    pub fn value(topic: &str) -> String {
        format!("{}-value", topic)
    }
}
