//! The primitive codec (C2): `format_T`/`parse_T` pairs converting leaf
//! DER bodies to and from native scalars.
//!
//! Every pair here satisfies `parse_T(format_T(x)) == x` for `x` in its
//! domain, and `format_T` always produces the unique canonical DER body for
//! that value.

mod bit_string;
mod boolean;
mod integer;
mod object_identifier;
mod real;
mod string;
mod time;

pub use bit_string::{format_bit_string, parse_bit_string, BitString};
pub use boolean::{format_boolean, parse_boolean};
pub use integer::{format_integer, parse_integer};
pub use object_identifier::{format_object_identifier, parse_object_identifier};
pub use real::{format_real, format_relative_oid, parse_real, parse_relative_oid};
pub use string::{format_string, parse_string};
pub use time::{
    format_generalized_time, format_utc_time, parse_generalized_time, parse_utc_time,
};
