//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Object-type codec translating JSON blocks to delimited protobuf."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Varint length prefix framing.
//!
//! ```text
//! ┌──────────────────┬──────────────────────┐
//! │ varint length N  │ protobuf payload (N) │
//! └──────────────────┴──────────────────────┘
//! ```
//!
//! Bytes after the announced payload are ignored.

use prost::encoding::{decode_varint, encode_varint, encoded_len_varint};

use crate::{CodecError, Result};

/// Prefix `payload` with its varint-encoded length.
pub fn delimit(payload: &[u8]) -> Vec<u8> {
    let size = payload.len() as u64;
    let mut out = Vec::with_capacity(encoded_len_varint(size) + payload.len());
    encode_varint(size, &mut out);
    out.extend_from_slice(payload);
    out
}

/// Strip the length prefix and return exactly the announced payload.
pub fn undelimit(encoded: &[u8]) -> Result<&[u8]> {
    let mut cursor = encoded;
    let size = decode_varint(&mut cursor).map_err(|_| CodecError::InvalidDelimiter)?;
    let size = usize::try_from(size).map_err(|_| CodecError::InvalidDelimiter)?;
    if cursor.len() < size {
        return Err(CodecError::Truncated {
            expected: size,
            available: cursor.len(),
        });
    }
    Ok(&cursor[..size])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_payload_has_one_byte_prefix() {
        assert_eq!(delimit(&[0x08, 0x02]), vec![0x02, 0x08, 0x02]);
        assert_eq!(delimit(&[]), vec![0x00]);
    }

    #[test]
    fn long_payload_has_multi_byte_prefix() {
        let payload = vec![0xaa; 300];
        let framed = delimit(&payload);
        // 300 = 0b10_0101100 -> 0xac 0x02
        assert_eq!(&framed[..2], &[0xac, 0x02]);
        assert_eq!(undelimit(&framed).unwrap(), payload.as_slice());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        assert_eq!(undelimit(&[0x01, 0x07, 0xff, 0xff]).unwrap(), &[0x07]);
    }

    #[test]
    fn missing_bytes_are_reported() {
        match undelimit(&[0x05, 0x01, 0x02]) {
            Err(CodecError::Truncated {
                expected,
                available,
            }) => {
                assert_eq!(expected, 5);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_input_has_no_delimiter() {
        assert!(matches!(undelimit(&[]), Err(CodecError::InvalidDelimiter)));
        // Continuation bit set on the last byte.
        assert!(matches!(undelimit(&[0x80]), Err(CodecError::InvalidDelimiter)));
    }
}
