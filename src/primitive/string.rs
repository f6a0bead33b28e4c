//! Character strings (UTF8String, IA5String, PrintableString, ...) and
//! OCTET STRING: the DER body *is* the value, verbatim. No charset
//! validation is performed on decode.

use alloc::vec::Vec;

pub fn format_string(value: &[u8]) -> Vec<u8> {
    value.to_vec()
}

pub fn parse_string(body: &[u8]) -> Vec<u8> {
    body.to_vec()
}
