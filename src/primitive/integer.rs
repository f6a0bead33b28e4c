//! INTEGER: two's-complement, big-endian, minimum length (X.690 §8.3).
//!
//! Native values are represented as [`i128`], which comfortably covers the
//! integers that appear as leaf fields in the protocols this crate targets
//! (X.509, Kerberos, LDAP, PKCS). Values that do not fit are reported as
//! [`crate::error::PrimitiveError::IntegerOverflow`] rather than silently
//! truncated.

use crate::error::primitive::IntegerOverflowSnafu;
use crate::error::PrimitiveError;
use alloc::vec::Vec;

/// Encodes `value` as the minimal-length two's-complement big-endian body.
pub fn format_integer(value: i128) -> Vec<u8> {
    if value == 0 {
        return alloc::vec![0x00];
    }
    let bytes = value.to_be_bytes();
    let mut start = 0;
    // Strip leading bytes that are redundant sign-extension: a leading
    // 0x00 is redundant unless the next byte's MSB is 1 (would read as
    // negative), a leading 0xFF is redundant unless the next byte's MSB
    // is 0 (would read as non-negative).
    while start + 1 < bytes.len() {
        let (head, next) = (bytes[start], bytes[start + 1]);
        let redundant = (head == 0x00 && next & 0x80 == 0) || (head == 0xff && next & 0x80 != 0);
        if redundant {
            start += 1;
        } else {
            break;
        }
    }
    bytes[start..].to_vec()
}

/// Decodes a minimal-length two's-complement big-endian body.
///
/// Does not require the body to be minimal-length to decode correctly
/// (non-minimal encodings are not valid DER, but the arithmetic is
/// well-defined regardless); callers that need to enforce canonicality
/// should re-encode and compare.
pub fn parse_integer(body: &[u8]) -> Result<i128, PrimitiveError> {
    if body.is_empty() {
        return Ok(0);
    }
    if body.len() > 16 {
        return IntegerOverflowSnafu.fail();
    }
    let negative = body[0] & 0x80 != 0;
    let mut buf = [if negative { 0xffu8 } else { 0x00 }; 16];
    buf[16 - body.len()..].copy_from_slice(body);
    Ok(i128::from_be_bytes(buf))
}
