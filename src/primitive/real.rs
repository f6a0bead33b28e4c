//! REAL and RELATIVE-OID have no codec in this crate.
//! X.690 §8.5's REAL encoding has enough base-2/base-10/ISO-6093 variation
//! that a correct implementation is its own project; RELATIVE-OID is
//! omitted for the same reason the original it is modelled on stubs it
//! (`quick_der.primitive.der_pack_RELATIVE_OID`) — it is rare on the wire
//! and not needed by any protocol this crate targets.

use crate::error::primitive::UnimplementedSnafu;
use crate::error::PrimitiveError;
use alloc::vec::Vec;

pub fn format_real(_value: f64) -> Result<Vec<u8>, PrimitiveError> {
    UnimplementedSnafu { what: "REAL" }.fail()
}

pub fn parse_real(_body: &[u8]) -> Result<f64, PrimitiveError> {
    UnimplementedSnafu { what: "REAL" }.fail()
}

pub fn format_relative_oid(_arcs: &[u64]) -> Result<Vec<u8>, PrimitiveError> {
    UnimplementedSnafu { what: "RELATIVE-OID" }.fail()
}

pub fn parse_relative_oid(_body: &[u8]) -> Result<Vec<u64>, PrimitiveError> {
    UnimplementedSnafu { what: "RELATIVE-OID" }.fail()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_is_unimplemented() {
        assert!(format_real(0.0).is_err());
        assert!(parse_real(&[]).is_err());
    }

    #[test]
    fn relative_oid_is_unimplemented() {
        assert!(format_relative_oid(&[1, 2]).is_err());
        assert!(parse_relative_oid(&[]).is_err());
    }
}
