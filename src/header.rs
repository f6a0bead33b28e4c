//! DER header (tag, length) parsing and emission (C1).
//!
//! Only the low-tag-number form is supported: a single
//! identifier octet, followed by a definite-length short- or long-form
//! length. Indefinite length (`0x80`) and the reserved `0xFF` length octet
//! are rejected.

use alloc::vec::Vec;
use nom::IResult;

use crate::error::decode::{
    BufferUnderflowSnafu, IndefiniteLengthSnafu, LengthOverflowSnafu, ReservedLengthOctetSnafu,
    TruncatedBodySnafu, UnsupportedHighTagNumberSnafu,
};
use crate::error::DecodeError;
use crate::tag::{Class, Tag};

/// A parsed DER header: tag, constructed flag, body length, and the
/// header's own length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub tag: Tag,
    pub constructed: bool,
    pub body_length: usize,
    pub header_length: usize,
}

/// Parses a single DER header from the front of `bytes`.
///
/// Fails with [`DecodeError::BufferUnderflow`] if `bytes` is too short to
/// hold even an identifier+length octet, [`DecodeError::UnsupportedHighTagNumber`]
/// if the identifier octet's tag field is `0x1f` (high-tag-number form),
/// [`DecodeError::IndefiniteLength`] if the length octet is `0x80`,
/// [`DecodeError::ReservedLengthOctet`] for the reserved `0xFF` length
/// octet, [`DecodeError::LengthOverflow`] if a long-form length would not
/// fit `usize`, and [`DecodeError::TruncatedBody`] if fewer than
/// `header_length + body_length` bytes remain.
pub fn parse_header(bytes: &[u8]) -> Result<Header, DecodeError> {
    let (rest, (tag, constructed)) = identifier_octet(bytes)
        .map_err(|_| BufferUnderflowSnafu { needed: 1usize }.build())?;
    if tag.number == 0x1f {
        return UnsupportedHighTagNumberSnafu.fail();
    }
    let (rest, body_length) = length_octets(rest)?;
    let header_length = bytes.len() - rest.len();
    if rest.len() < body_length {
        return TruncatedBodySnafu { declared: body_length, available: rest.len() }.fail();
    }
    Ok(Header { tag, constructed, body_length, header_length })
}

fn identifier_octet(input: &[u8]) -> IResult<&[u8], (Tag, bool)> {
    let (input, octet) = nom::bytes::complete::take(1usize)(input)?;
    let octet = octet[0];
    let class = Class::from_bits(octet >> 6);
    let constructed = octet & 0x20 != 0;
    let number = octet & 0x1f;
    Ok((input, (Tag::new(class, number), constructed)))
}

fn length_octets(input: &[u8]) -> Result<(&[u8], usize), DecodeError> {
    let (input, first) = nom::bytes::complete::take(1usize)(input)
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| BufferUnderflowSnafu { needed: 1usize }.build())?;
    let first = first[0];
    if first & 0x80 == 0 {
        return Ok((input, first as usize));
    }
    if first == 0x80 {
        return IndefiniteLengthSnafu.fail();
    }
    if first == 0xff {
        return ReservedLengthOctetSnafu.fail();
    }
    let count = (first & 0x7f) as usize;
    let (input, octets) = nom::bytes::complete::take(count)(input)
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| BufferUnderflowSnafu { needed: count }.build())?;
    let mut length: usize = 0;
    for &b in octets {
        length = length
            .checked_shl(8)
            .and_then(|v| v.checked_add(b as usize))
            .ok_or_else(|| LengthOverflowSnafu.build())?;
    }
    Ok((input, length))
}

/// The number of octets required to encode `length` in minimal long form,
/// not counting the leading `0x80|k` marker octet.
fn long_form_octet_count(length: usize) -> usize {
    let bits = usize::BITS - length.leading_zeros();
    core::cmp::max(1, bits.div_ceil(8) as usize)
}

/// Emits a canonical DER header for a value tagged `tag` (with the given
/// `constructed` flag) whose body is `body_length` bytes long.
///
/// Produces short-form length for `body_length <= 127`, otherwise minimal
/// long form. Never emits a leading zero length octet, and never emits
/// indefinite length.
pub fn emit_header(tag: Tag, constructed: bool, body_length: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(2);
    out.push(tag.identifier_octet(constructed));
    if body_length <= 0x7f {
        out.push(body_length as u8);
    } else {
        let count = long_form_octet_count(body_length);
        out.push(0x80 | count as u8);
        for shift in (0..count).rev() {
            out.push((body_length >> (shift * 8)) as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_vector_a() {
        let bytes = [0x30u8, 0x0e];
        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.tag, Tag::SEQUENCE);
        assert!(header.constructed);
        assert_eq!(header.body_length, 14);
        assert_eq!(header.header_length, 2);
    }

    #[test]
    fn short_form_round_trip() {
        for len in [0usize, 1, 42, 127] {
            let header = emit_header(Tag::OCTET_STRING, false, len);
            let mut full = header.clone();
            full.extend(core::iter::repeat(0u8).take(len));
            let parsed = parse_header(&full).unwrap();
            assert_eq!(parsed.body_length, len);
            assert_eq!(parsed.header_length, header.len());
        }
    }

    #[test]
    fn long_form_is_minimal() {
        let header = emit_header(Tag::OCTET_STRING, false, 128);
        assert_eq!(header, alloc::vec![0x04, 0x81, 0x80]);
        let header = emit_header(Tag::OCTET_STRING, false, 256);
        assert_eq!(header, alloc::vec![0x04, 0x82, 0x01, 0x00]);
        let header = emit_header(Tag::OCTET_STRING, false, 65536);
        assert_eq!(header, alloc::vec![0x04, 0x83, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn rejects_indefinite_length() {
        let bytes = [0x30u8, 0x80];
        assert_eq!(parse_header(&bytes).unwrap_err(), DecodeError::IndefiniteLength);
    }

    #[test]
    fn rejects_reserved_length_octet() {
        let bytes = [0x30u8, 0xff];
        assert_eq!(parse_header(&bytes).unwrap_err(), DecodeError::ReservedLengthOctet);
    }

    #[test]
    fn rejects_truncated_body() {
        let bytes = [0x04u8, 0x05, 0x01, 0x02];
        assert_eq!(
            parse_header(&bytes).unwrap_err(),
            DecodeError::TruncatedBody { declared: 5, available: 2 }
        );
    }

    #[test]
    fn rejects_high_tag_number_form() {
        let bytes = [0x1fu8, 0x00];
        assert_eq!(
            parse_header(&bytes).unwrap_err(),
            DecodeError::UnsupportedHighTagNumber
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(
            parse_header(&[]).unwrap_err(),
            DecodeError::BufferUnderflow { needed: 1 }
        );
    }
}
