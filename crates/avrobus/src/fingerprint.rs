//! Schema fingerprinting for deduplication and cache keys

use apache_avro::Schema;
use sha2::{Digest, Sha256};

/// SHA-256 over the Parsing Canonical Form of a schema
///
/// Two schemas that differ only in formatting, field order of JSON attributes,
/// or documentation share a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaFingerprint([u8; 32]);

impl SchemaFingerprint {
    pub fn compute(schema: &Schema) -> Self {
        let canonical = schema.canonical_form();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Self(digest)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for SchemaFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
