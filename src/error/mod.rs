//! Error types for the header codec (C1), primitive codec (C2), and the
//! unpack/pack interpreters (C3/C4).
//!
//! Backtraces are enabled by default with the `backtraces` feature, via
//! `snafu`'s own backtrace support.

pub(crate) mod decode;
pub(crate) mod encode;
pub(crate) mod primitive;

pub use decode::DecodeError;
pub use encode::EncodeError;
pub use primitive::PrimitiveError;

/// Trait implemented by every error type in this crate, providing a way to
/// construct a custom error carrying a message for unusual situations.
pub trait Error: core::fmt::Debug {
    fn custom<D: core::fmt::Display>(msg: D) -> Self;
}
