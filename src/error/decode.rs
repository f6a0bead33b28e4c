use crate::tag::Tag;
use alloc::string::String;
use snafu::Snafu;

/// Errors produced while parsing a DER header (C1) or while walking a
/// packer program over DER input (C3).
#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    /// The input is empty where at least one header octet was required.
    #[snafu(display("buffer underflow: expected at least {needed} more byte(s)"))]
    BufferUnderflow { needed: usize },

    /// High-tag-number form (tag number 31, continued octets) was seen.
    /// This crate only supports the single-byte low-tag-number form.
    #[snafu(display("high-tag-number form is not supported"))]
    UnsupportedHighTagNumber,

    /// The length octet announced indefinite length (`0x80`), which DER
    /// forbids.
    #[snafu(display("indefinite length is not valid DER"))]
    IndefiniteLength,

    /// A long-form length used the reserved `0xFF` marker.
    #[snafu(display("reserved length octet 0xFF"))]
    ReservedLengthOctet,

    /// A long-form length's octet count overflowed the platform's `usize`.
    #[snafu(display("length encoding overflows the platform word size"))]
    LengthOverflow,

    /// The header declares more body bytes than remain in the input.
    #[snafu(display("header declares {declared} body bytes but only {available} remain"))]
    TruncatedBody { declared: usize, available: usize },

    /// A `STORE`/`ENTER`/`ANY` site required a specific tag and the input's
    /// tag did not match.
    #[snafu(display("expected tag {expected:?}, found {actual:?}"))]
    TagMismatch { expected: Tag, actual: Tag },

    /// A `STORE`/`ENTER` site required constructed/primitive encoding and
    /// the input used the other form.
    #[snafu(display("expected {expected} encoding for tag {tag:?}", expected = if *expected_constructed { "constructed" } else { "primitive" }))]
    EncodingFormMismatch { tag: Tag, expected_constructed: bool },

    /// A non-`OPTIONAL` `STORE`/`ENTER` ran out of input.
    #[snafu(display("missing required value for tag {tag:?}"))]
    MissingRequired { tag: Tag },

    /// No `CHOICE` alternative's leading tag matched the input.
    #[snafu(display("no CHOICE alternative matched the input"))]
    ChoiceNoMatch,

    /// Bytes remained in a scope after its `LEAVE`/`END` fired.
    #[snafu(display("{count} trailing byte(s) after the scope's declared length"))]
    TrailingGarbage { count: usize },

    /// A leaf value's body could not be interpreted as the requested
    /// native type (C2). Wraps a [`crate::error::PrimitiveError`].
    #[snafu(display("could not decode primitive value: {source}"))]
    Primitive {
        source: alloc::boxed::Box<crate::error::PrimitiveError>,
    },

    /// A catch-all for situations not covered by the other variants.
    #[snafu(display("{msg}"))]
    Custom { msg: String },
}

impl super::Error for DecodeError {
    fn custom<D: core::fmt::Display>(msg: D) -> Self {
        use alloc::string::ToString;
        Self::Custom { msg: msg.to_string() }
    }
}

impl From<crate::error::PrimitiveError> for DecodeError {
    fn from(source: crate::error::PrimitiveError) -> Self {
        Self::Primitive { source: alloc::boxed::Box::new(source) }
    }
}
