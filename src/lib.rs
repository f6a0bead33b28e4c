//! A compact DER codec engine: an interpreter over a small bytecode
//! ("packer program") describing one ASN.1 type's shape, plus the
//! navigation layer that turns the flat array it produces into named
//! fields.
//!
//! The runtime here (tag handling, header codec, primitive value codecs,
//! the `unpack`/`pack` interpreters, and the recipe/view navigation layer)
//! is deliberately separate from the ASN.1 notation compiler that produces
//! packer programs and recipes from `.asn1` source — see the
//! `asnpack-compiler` crate for that half.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod cursor;
pub mod error;
pub mod header;
pub mod opcode;
pub mod pack;
pub mod primitive;
pub mod recipe;
pub mod tag;
pub mod unpack;

pub use cursor::{Cursor, CursorArray};
pub use error::{DecodeError, EncodeError, PrimitiveError};
pub use pack::pack;
pub use recipe::{Element, Field, Recipe, SubParser, View};
pub use tag::{Class, Tag};
pub use unpack::unpack;
