//! BOOLEAN: DER mandates `0xFF` for TRUE and `0x00` for FALSE on the wire
//! (X.690 §11.1). BER tolerates any non-zero body as TRUE on decode, but
//! this codec resolves the question DER-strict in both directions: decode
//! rejects anything but `0x00`/`0xFF`, and encode only ever emits those two.

use crate::error::primitive::InvalidBooleanSnafu;
use crate::error::PrimitiveError;
use alloc::vec::Vec;

pub fn format_boolean(value: bool) -> Vec<u8> {
    alloc::vec![if value { 0xff } else { 0x00 }]
}

pub fn parse_boolean(body: &[u8]) -> Result<bool, PrimitiveError> {
    match body {
        [0x00] => Ok(false),
        [0xff] => Ok(true),
        _ => InvalidBooleanSnafu { body: body.to_vec() }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        assert_eq!(parse_boolean(&format_boolean(true)).unwrap(), true);
        assert_eq!(parse_boolean(&format_boolean(false)).unwrap(), false);
    }

    #[test]
    fn format_is_canonical() {
        assert_eq!(format_boolean(true), alloc::vec![0xff]);
        assert_eq!(format_boolean(false), alloc::vec![0x00]);
    }

    #[test]
    fn rejects_ber_style_truthy_bodies() {
        assert!(parse_boolean(&[0x01]).is_err());
        assert!(parse_boolean(&[0x7f]).is_err());
    }
}
