use crate::tag::Tag;
use alloc::string::String;
use snafu::Snafu;

/// Errors produced while walking a packer program over a cursor array to
/// produce DER output (C4).
#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum EncodeError {
    /// A non-`OPTIONAL` slot required by the program held the empty-cursor
    /// sentinel.
    #[snafu(display("missing required value for tag {tag:?}"))]
    MissingRequired { tag: Tag },

    /// A computed body length exceeded the platform's maximum representable
    /// length.
    #[snafu(display("encoded length overflows the platform word size"))]
    OverflowLength,

    /// The cursor array's length did not match what the packer program
    /// expects (programmer error: a cursor array from a different program).
    #[snafu(display("cursor array has {actual} slot(s), program expects {expected}"))]
    CursorCountMismatch { expected: usize, actual: usize },

    /// A leaf value could not be formatted from its native value (C2).
    #[snafu(display("could not encode primitive value: {source}"))]
    Primitive {
        source: alloc::boxed::Box<crate::error::PrimitiveError>,
    },

    #[snafu(display("{msg}"))]
    Custom { msg: String },
}

impl super::Error for EncodeError {
    fn custom<D: core::fmt::Display>(msg: D) -> Self {
        use alloc::string::ToString;
        Self::Custom { msg: msg.to_string() }
    }
}

impl From<crate::error::PrimitiveError> for EncodeError {
    fn from(source: crate::error::PrimitiveError) -> Self {
        Self::Primitive { source: alloc::boxed::Box::new(source) }
    }
}
