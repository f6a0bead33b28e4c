use snafu::Snafu;

/// Errors produced by the primitive codec (C2) when converting a leaf
/// cursor's body to or from a native scalar.
#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum PrimitiveError {
    /// DER mandates `0x00` (FALSE) or `0xFF` (TRUE) exactly.
    #[snafu(display("BOOLEAN body must be a single 0x00 or 0xFF octet, got {0:?}", body))]
    InvalidBoolean { body: alloc::vec::Vec<u8> },

    /// An OBJECT IDENTIFIER body ended mid-arc (final octet had its
    /// continuation bit set) or was empty.
    #[snafu(display("malformed OBJECT IDENTIFIER encoding"))]
    InvalidObjectIdentifier,

    /// An OBJECT IDENTIFIER arc used a non-minimal (leading `0x80`)
    /// base-128 encoding.
    #[snafu(display("non-minimal OBJECT IDENTIFIER arc encoding"))]
    NonMinimalObjectIdentifierArc,

    /// A dotted OID string could not be parsed, or had fewer than two arcs.
    #[snafu(display("invalid OID string {value:?}"))]
    InvalidObjectIdentifierString { value: alloc::string::String },

    /// A BIT STRING's first octet (unused-bit count) was outside `0..=7`,
    /// or the body was empty while claiming unused bits.
    #[snafu(display("invalid BIT STRING unused-bits octet {unused_bits}"))]
    InvalidBitString { unused_bits: u8 },

    /// A UTCTime/GeneralizedTime body did not match the canonical DER
    /// "Z" form.
    #[snafu(display("invalid {kind} value {value:?}"))]
    InvalidTime {
        kind: &'static str,
        value: alloc::string::String,
    },

    /// A declared INTEGER is too large to fit the requested native integer
    /// width.
    #[snafu(display("INTEGER value does not fit in the requested width"))]
    IntegerOverflow,

    /// REAL and RELATIVE-OID have no codec in this crate; see the scope
    /// decision recorded in DESIGN.md.
    #[snafu(display("{what} has no codec in this crate"))]
    Unimplemented { what: &'static str },
}
