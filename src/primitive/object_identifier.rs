//! OBJECT IDENTIFIER: base-128 arcs with a continuation bit, first two arcs
//! packed as `arc1*40 + arc2` (X.690 §8.19).

use crate::error::primitive::{
    InvalidObjectIdentifierSnafu, InvalidObjectIdentifierStringSnafu,
    NonMinimalObjectIdentifierArcSnafu,
};
use crate::error::PrimitiveError;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// The highest value the first arc may take (X.680 §32.3: 0, 1, or 2).
const MAX_FIRST_ARC: u64 = 2;
/// The highest value the second arc may take when the first arc is 0 or 1
/// (X.680 §32.3: the joined value `arc1*40+arc2` must stay unambiguous).
const MAX_SECOND_ARC_FOR_SMALL_FIRST: u64 = 39;

/// Encodes a dotted OID string (e.g. `"1.2.840.113549"`) as its DER body.
pub fn format_object_identifier(oid: &str) -> Result<Vec<u8>, PrimitiveError> {
    let mut arcs = Vec::new();
    for part in oid.split('.') {
        let arc: u64 = part
            .parse()
            .map_err(|_| InvalidObjectIdentifierStringSnafu { value: oid.to_string() }.build())?;
        arcs.push(arc);
    }
    if arcs.len() < 2 || arcs[0] > MAX_FIRST_ARC {
        return InvalidObjectIdentifierStringSnafu { value: oid.to_string() }.fail();
    }
    if arcs[0] < MAX_FIRST_ARC && arcs[1] > MAX_SECOND_ARC_FOR_SMALL_FIRST {
        return InvalidObjectIdentifierStringSnafu { value: oid.to_string() }.fail();
    }
    let mut out = Vec::new();
    encode_arc(arcs[0] * (MAX_SECOND_ARC_FOR_SMALL_FIRST + 1) + arcs[1], &mut out);
    for &arc in &arcs[2..] {
        encode_arc(arc, &mut out);
    }
    Ok(out)
}

fn encode_arc(mut arc: u64, out: &mut Vec<u8>) {
    let mut groups = alloc::vec![(arc & 0x7f) as u8];
    arc >>= 7;
    while arc > 0 {
        groups.push((arc & 0x7f) as u8 | 0x80);
        arc >>= 7;
    }
    out.extend(groups.into_iter().rev());
}

/// Decodes a DER OBJECT IDENTIFIER body to its dotted string form.
pub fn parse_object_identifier(body: &[u8]) -> Result<String, PrimitiveError> {
    let arcs = parse_base128_arcs(body)?;
    let joined = arcs[0];
    let threshold = MAX_SECOND_ARC_FOR_SMALL_FIRST + 1;
    let (arc1, arc2) = if joined > MAX_FIRST_ARC * threshold + MAX_SECOND_ARC_FOR_SMALL_FIRST {
        (MAX_FIRST_ARC, joined - MAX_FIRST_ARC * threshold)
    } else {
        (joined / threshold, joined % threshold)
    };
    let mut parts = alloc::vec![arc1.to_string(), arc2.to_string()];
    parts.extend(arcs[1..].iter().map(|a| a.to_string()));
    Ok(parts.join("."))
}

/// Splits a DER OID/RELATIVE-OID body into its base-128 arc values,
/// rejecting non-minimal (leading `0x80`) arc encodings.
fn parse_base128_arcs(body: &[u8]) -> Result<Vec<u64>, PrimitiveError> {
    if body.is_empty() {
        return InvalidObjectIdentifierSnafu.fail();
    }
    let mut arcs = Vec::new();
    let mut current: u64 = 0;
    let mut in_arc = false;
    for (i, &byte) in body.iter().enumerate() {
        if !in_arc && byte == 0x80 {
            return NonMinimalObjectIdentifierArcSnafu.fail();
        }
        in_arc = true;
        current = (current << 7) | (byte & 0x7f) as u64;
        if byte & 0x80 == 0 {
            arcs.push(current);
            current = 0;
            in_arc = false;
        } else if i == body.len() - 1 {
            return InvalidObjectIdentifierSnafu.fail();
        }
    }
    Ok(arcs)
}
