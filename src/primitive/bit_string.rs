//! BIT STRING: a leading "unused bits" octet (`0..=7`) followed by the bit
//! payload, most significant bit first (X.690 §8.6).

use crate::error::primitive::InvalidBitStringSnafu;
use crate::error::PrimitiveError;
use alloc::vec::Vec;
use bitvec::prelude::*;

/// A BIT STRING value: an ordered sequence of bits, numbered from 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitString(BitVec<u8, Msb0>);

impl BitString {
    pub fn new() -> Self {
        Self(BitVec::new())
    }

    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self(bits.into_iter().collect())
    }

    pub fn is_set(&self, bit: usize) -> bool {
        self.0.get(bit).as_deref().copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw backing bytes (MSB-first within each byte), without the
    /// unused-bits count, for callers that want a byte view rather than a
    /// bit-indexed one.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_raw_slice()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().by_vals()
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self::from_bits(iter)
    }
}

pub fn format_bit_string(value: &BitString) -> Vec<u8> {
    let bits = &value.0;
    if bits.is_empty() {
        return alloc::vec![0x00];
    }
    let unused = (8 - (bits.len() % 8)) % 8;
    let mut out = Vec::with_capacity(1 + bits.as_raw_slice().len());
    out.push(unused as u8);
    out.extend_from_slice(bits.as_raw_slice());
    out
}

pub fn parse_bit_string(body: &[u8]) -> Result<BitString, PrimitiveError> {
    if body.is_empty() {
        return InvalidBitStringSnafu { unused_bits: 0u8 }.fail();
    }
    let unused = body[0];
    if unused > 7 {
        return InvalidBitStringSnafu { unused_bits: unused }.fail();
    }
    if unused > 0 && body.len() == 1 {
        return InvalidBitStringSnafu { unused_bits: unused }.fail();
    }
    let mut bits: BitVec<u8, Msb0> = BitVec::from_slice(&body[1..]);
    bits.truncate(bits.len() - unused as usize);
    Ok(BitString(bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_sparse_bits() {
        for set in [
            alloc::vec![1usize, 5, 7],
            alloc::vec![],
            alloc::vec![22],
            alloc::vec![100, 101],
        ] {
            let max = set.iter().copied().max().unwrap_or(0);
            let mut bits = alloc::vec![false; max + 1];
            for &b in &set {
                bits[b] = true;
            }
            let value = BitString::from_bits(bits.clone());
            let body = format_bit_string(&value);
            let parsed = parse_bit_string(&body).unwrap();
            for (i, &expected) in bits.iter().enumerate() {
                assert_eq!(parsed.is_set(i), expected, "bit {i}");
            }
        }
    }

    #[test]
    fn empty_bit_string_is_single_zero_octet() {
        assert_eq!(format_bit_string(&BitString::new()), alloc::vec![0x00]);
        assert!(parse_bit_string(&[0x00]).unwrap().is_empty());
    }

    #[test]
    fn rejects_unused_bits_above_seven() {
        assert!(parse_bit_string(&[0x08, 0xff]).is_err());
    }

    #[test]
    fn rejects_empty_payload_with_unused_bits() {
        assert!(parse_bit_string(&[0x01]).is_err());
    }
}
