//! Codec and registry errors
//!
//! Passing a value of an unsupported kind to the encoder is a programming
//! error and panics; it is intentionally absent from these enums.

use crate::types::SchemaId;
use thiserror::Error;

/// Confluent-compatible registry error codes
pub mod error_codes {
    pub const SUBJECT_NOT_FOUND: u32 = 40401;
    pub const VERSION_NOT_FOUND: u32 = 40402;
    pub const SCHEMA_NOT_FOUND: u32 = 40403;
    pub const INCOMPATIBLE_SCHEMA: u32 = 409;
    pub const INVALID_SCHEMA: u32 = 42201;
}

/// Errors raised by a schema registry client
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("schema not found: id {0}")]
    SchemaNotFound(SchemaId),

    #[error("subject not found: {0}")]
    SubjectNotFound(String),

    #[error("incompatible schema: {0}")]
    IncompatibleSchema(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("registry returned {status}: {message}")]
    Server {
        status: u16,
        error_code: Option<u32>,
        message: String,
    },

    #[error("registry request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// True when the registry has no schema for the requested id or subject
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::SchemaNotFound(_) | RegistryError::SubjectNotFound(_)
        )
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RegistryError::Timeout(e.to_string())
        } else {
            RegistryError::Network(e.to_string())
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while encoding or decoding a frame
#[derive(Debug, Error)]
pub enum CodecError {
    /// The first byte of the frame is not the magic marker
    #[error("unknown magic byte: expected 0x00, got {0:#04x}")]
    BadMagicByte(u8),

    /// The frame is shorter than the 5-byte header
    #[error("frame too short: {0} bytes, header needs 5")]
    FrameTooShort(usize),

    /// Registration or lookup failed; the registry error is kept as is
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The value did not match its schema, or the body could not be read
    #[error("avro error: {0}")]
    Avro(Box<apache_avro::Error>),
}

impl CodecError {
    /// True for frames rejected before any registry lookup
    pub fn is_malformed_frame(&self) -> bool {
        matches!(
            self,
            CodecError::BadMagicByte(_) | CodecError::FrameTooShort(_)
        )
    }
}

impl From<apache_avro::Error> for CodecError {
    fn from(e: apache_avro::Error) -> Self {
        CodecError::Avro(Box::new(e))
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
