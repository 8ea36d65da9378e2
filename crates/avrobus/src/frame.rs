//! Wire framing
//!
//! Every encoded message is framed as
//!
//! ```text
//! [0x00][schema_id: 4 bytes big-endian][avro binary body]
//! ```
//!
//! which is the framing used by Confluent serializers, so frames written here
//! can be read by any consumer that understands it and vice versa.

use crate::error::{CodecError, CodecResult};
use crate::types::SchemaId;
use bytes::BufMut;

/// Leading byte of every valid frame
pub const MAGIC_BYTE: u8 = 0x00;

/// Magic byte plus the 4-byte schema id
pub const HEADER_LEN: usize = 5;

/// Append the frame header for `id` to `buf`
pub fn write_header<B: BufMut>(buf: &mut B, id: SchemaId) {
    buf.put_u8(MAGIC_BYTE);
    buf.put_i32(id.as_i32());
}

/// Build the header as a standalone array
pub fn encode_header(id: SchemaId) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0] = MAGIC_BYTE;
    header[1..].copy_from_slice(&id.to_be_bytes());
    header
}

/// Split a frame into its schema id and body
///
/// The magic byte is checked before anything else; a frame that does not start
/// with it is rejected without looking at its length or id bytes.
pub fn parse_header(data: &[u8]) -> CodecResult<(SchemaId, &[u8])> {
    let Some(&first) = data.first() else {
        return Err(CodecError::FrameTooShort(0));
    };
    if first != MAGIC_BYTE {
        return Err(CodecError::BadMagicByte(first));
    }
    if data.len() < HEADER_LEN {
        return Err(CodecError::FrameTooShort(data.len()));
    }

    let id = SchemaId::from_be_bytes([data[1], data[2], data[3], data[4]]);
    Ok((id, &data[HEADER_LEN..]))
}

/// Read the schema id of a frame without validating the rest of it
pub fn peek_schema_id(data: &[u8]) -> Option<SchemaId> {
    parse_header(data).ok().map(|(id, _)| id)
}
