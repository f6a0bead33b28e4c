//! Recipes (C5): a tree describing how to navigate one compiled type's flat
//! [`CursorArray`] as named fields, without re-walking the packer program by
//! hand.
//!
//! A [`Recipe`] mirrors the *shape* of its packer program but not its byte
//! encoding: every `STORE`/`ANY` site the program can produce gets exactly
//! one [`Recipe::Leaf`], carrying that site's absolute slot index into the
//! flat cursor array, and `ENTER` regions that have field names attached
//! become [`Recipe::Named`] groupings over the same array (no nested array,
//! no copying — field access just changes which recipe node is current).
//!
//! `SEQUENCE OF`/`SET OF` fields and `CHOICE`/recursive type references are
//! the two cases a flat, statically-sized cursor array cannot represent on
//! its own: a repeated field's element count is data-dependent, and a
//! self-referential type's nesting depth is unbounded. Both are compiled as
//! a single opaque slot at the point of use — [`Recipe::Repeated`] stores a
//! `STORE|SEQUENCE`/`STORE|SET` slot holding the container's body directly
//! (its own tag and length are already consumed by the `STORE`; the body is
//! a concatenation of independently-headered element TLVs); [`Recipe::TypeRef`]
//! stores an `ANY` slot holding one complete TLV of the referenced type
//! (unlike a repeated field, a type reference can cross an `IMPLICIT`
//! tag boundary into a type whose own outer tag isn't known statically, so
//! its header has to travel with it), re-parsed with that type's own
//! (top-level) program on demand. Either way, descending into
//! that field re-invokes [`crate::unpack::unpack`] on just the captured
//! span, producing a fresh, independent cursor array the caller navigates
//! the same way as the top-level one.
//!
//! This secondary unpacking happens on every access rather than being
//! cached: a `Recipe` is `&'static` data with no room for interior mutable
//! state, and the values here are cheap enough (compact DER) that
//! re-deriving them is simpler than adding a caching layer.

use alloc::vec::Vec;

use crate::cursor::{Cursor, CursorArray};
use crate::error::DecodeError;
use crate::header::parse_header;
use crate::unpack::unpack;

/// Looks up `name` in a [`Recipe::Named`] field list under the shared
/// dash/trailing-underscore normalization policy (see [`View::field`]).
fn lookup_field<'r>(fields: &'r [(&'static str, Recipe)], name: &str) -> Option<&'r Recipe> {
    let normalized = name.replace('-', "_");
    let lookup = |query: &str| fields.iter().find(|(field_name, _)| *field_name == query).map(|(_, r)| r);
    lookup(&normalized).or_else(|| lookup(normalized.strip_suffix('_')?))
}

/// Walks a dotted path (`"inner.b"`) through nested [`Recipe::Named`] groups,
/// returning the recipe node at the end of the path.
fn resolve_path<'r>(mut recipe: &'r Recipe, path: &str) -> Option<&'r Recipe> {
    for segment in path.split('.') {
        let Recipe::Named(fields) = recipe else { return None };
        recipe = lookup_field(fields, segment)?;
    }
    Some(recipe)
}

/// One entry of a module's generated sub-parser table (`DER_PSUB_M_T` in the
/// Rust back-end's naming scheme): the packer program and recipe for a
/// `SEQUENCE OF`/`SET OF` element type or a recursion-cut type reference,
/// named for readability in generated source. [`Recipe::Repeated`]
/// and [`Recipe::TypeRef`] nodes hold their own direct `&'static` pointers
/// to the same program/recipe statics this table's entries name — the table
/// exists so generated code has one place per module listing every nested
/// parser it emits, not because navigation depends on it.
#[derive(Debug, Clone, Copy)]
pub struct SubParser {
    pub name: &'static str,
    pub program: &'static [u8],
    pub recipe: &'static Recipe,
}

/// One node of a compiled type's navigation tree.
#[derive(Debug, Clone, Copy)]
pub enum Recipe {
    /// A single `STORE`/`ANY` site, addressed by its absolute slot index.
    Leaf(usize),
    /// A named grouping over fields that live in the same cursor array
    /// (an inline `ENTER` region, or the type's own top level).
    Named(&'static [(&'static str, Recipe)]),
    /// A `SEQUENCE OF`/`SET OF` field: slot `slot` holds the container's
    /// body directly (a concatenation of element TLVs); each element is
    /// re-parsed with `element_program`/`element_recipe`.
    Repeated { slot: usize, element_program: &'static [u8], element_recipe: &'static Recipe },
    /// A defined-type reference compiled opaquely (recursion cut, or simply
    /// not inlined): slot `slot` holds one complete TLV, re-parsed with the
    /// referenced type's own `program`/`recipe`.
    TypeRef { slot: usize, program: &'static [u8], recipe: &'static Recipe },
}

/// A navigable view over one cursor array and the buffer its cursors are
/// relative to.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    input: &'a [u8],
    cursors: &'a CursorArray,
    recipe: &'static Recipe,
}

/// A cursor array decoded on demand (for a `Repeated` element or a resolved
/// `TypeRef`), together with the buffer it is relative to. Owns its cursor
/// array so it can outlive the call that produced it.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    input: &'a [u8],
    cursors: CursorArray,
    recipe: &'static Recipe,
}

impl<'a> Element<'a> {
    pub fn view(&self) -> View<'_> {
        View { input: self.input, cursors: &self.cursors, recipe: self.recipe }
    }
}

/// One field looked up by name from a [`Recipe::Named`] node.
pub enum Field<'a> {
    /// Raw bytes for a populated leaf, or `None` for an absent
    /// `OPTIONAL`/unchosen `CHOICE` leaf.
    Leaf(Option<&'a [u8]>),
    /// An inline nested structure sharing this view's cursor array.
    Nested(View<'a>),
    /// A `SEQUENCE OF`/`SET OF` field, not yet split into elements. `body`
    /// is the container's body (its own tag and length already consumed).
    Repeated { body: Option<&'a [u8]>, element_program: &'static [u8], element_recipe: &'static Recipe },
    /// A defined-type reference, not yet re-parsed.
    TypeRef { tlv: Option<&'a [u8]>, program: &'static [u8], recipe: &'static Recipe },
}

impl<'a> View<'a> {
    /// Constructs a view over the root of a freshly-unpacked cursor array.
    pub fn new(cursors: &'a CursorArray, input: &'a [u8], recipe: &'static Recipe) -> Self {
        Self { input, cursors, recipe }
    }

    /// Looks up a named field. Returns `None` if this view is not over a
    /// [`Recipe::Named`] node, or the name is not one of its fields.
    ///
    /// Field-name policy: dashes in the ASN.1 identifier are
    /// replaced by underscores on both definition and lookup, and a single
    /// trailing underscore is stripped from the query if the unstripped
    /// name has no match — this lets generated accessors disambiguate a
    /// field whose ASN.1 name collides with a host-language reserved word
    /// (e.g. `type_`) while still finding the recipe's stored `type` entry.
    pub fn field(&self, name: &str) -> Option<Field<'a>> {
        let Recipe::Named(fields) = self.recipe else { return None };
        Some(self.resolve(lookup_field(fields, name)?))
    }

    /// The field names this view exposes, in declaration order. Empty if
    /// this view is not over a [`Recipe::Named`] node.
    pub fn field_names(&self) -> Vec<&'static str> {
        match self.recipe {
            Recipe::Named(fields) => fields.iter().map(|(name, _)| *name).collect(),
            _ => Vec::new(),
        }
    }

    fn slot_bytes(&self, slot: usize) -> Option<&'a [u8]> {
        let cursor = self.cursors.get(slot)?;
        if cursor.is_empty() {
            None
        } else {
            Some(cursor.slice(self.input))
        }
    }

    fn resolve(&self, recipe: &'static Recipe) -> Field<'a> {
        match recipe {
            Recipe::Leaf(slot) => Field::Leaf(self.slot_bytes(*slot)),
            Recipe::Named(_) => Field::Nested(View { input: self.input, cursors: self.cursors, recipe }),
            Recipe::Repeated { slot, element_program, element_recipe } => Field::Repeated {
                body: self.slot_bytes(*slot),
                element_program,
                element_recipe,
            },
            Recipe::TypeRef { slot, program, recipe } => {
                Field::TypeRef { tlv: self.slot_bytes(*slot), program, recipe }
            }
        }
    }
}

impl<'a> Field<'a> {
    pub fn as_leaf(&self) -> Option<&'a [u8]> {
        match self {
            Field::Leaf(bytes) => *bytes,
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<View<'a>> {
        match self {
            Field::Nested(view) => Some(*view),
            _ => None,
        }
    }

    /// Splits a `Repeated` field's captured container body into its
    /// elements, each re-parsed with the element program. Returns an empty
    /// `Vec` for an absent (`OPTIONAL`, zero-length) repeated field.
    pub fn elements(&self) -> Result<Vec<Element<'a>>, DecodeError> {
        let Field::Repeated { body, element_program, element_recipe } = self else {
            return Ok(Vec::new());
        };
        let Some(body) = body else { return Ok(Vec::new()) };
        let mut out = Vec::new();
        let mut pos = 0usize;
        while pos < body.len() {
            let header = parse_header(&body[pos..])?;
            let total = header.header_length + header.body_length;
            let span = &body[pos..pos + total];
            out.push(Element { input: span, cursors: unpack(element_program, span)?, recipe: element_recipe });
            pos += total;
        }
        Ok(out)
    }

    /// Re-parses a `TypeRef` field's captured TLV with the referenced
    /// type's own program. Returns `None` for an absent
    /// `OPTIONAL`/unchosen-`CHOICE` reference.
    pub fn resolve(&self) -> Result<Option<Element<'a>>, DecodeError> {
        let Field::TypeRef { tlv, program, recipe } = self else { return Ok(None) };
        let Some(tlv) = tlv else { return Ok(None) };
        Ok(Some(Element { input: tlv, cursors: unpack(program, tlv)?, recipe }))
    }
}

/// A decoded document: an owned buffer, the cursor array unpacked from it,
/// and the recipe navigating both. Implements spec.md §4.5's mutation
/// contract — unlike [`View`], which only ever borrows, a `Document` owns
/// its buffer so a leaf write can append freshly formatted bytes to it
/// without disturbing any other field's cursor.
#[derive(Debug, Clone)]
pub struct Document {
    buffer: Vec<u8>,
    cursors: CursorArray,
    recipe: &'static Recipe,
}

impl Document {
    pub fn new(buffer: Vec<u8>, cursors: CursorArray, recipe: &'static Recipe) -> Self {
        Self { buffer, cursors, recipe }
    }

    /// A read-only view over the document's current state.
    pub fn view(&self) -> View<'_> {
        View::new(&self.cursors, &self.buffer, self.recipe)
    }

    pub fn cursors(&self) -> &CursorArray {
        &self.cursors
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Assigns `body` (already formatted — see C2) to the leaf at `path`.
    /// Appends to the document's buffer and repoints the slot's cursor;
    /// every other slot is untouched. Returns `false` if `path` does not
    /// resolve to a [`Recipe::Leaf`].
    pub fn set_leaf(&mut self, path: &str, body: &[u8]) -> bool {
        let Some(Recipe::Leaf(slot)) = resolve_path(self.recipe, path) else { return false };
        let slot = *slot;
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(body);
        self.cursors.set(slot, Cursor::new(offset, body.len()));
        true
    }

    /// Clears the leaf, repeated, or type-reference slot at `path` to the
    /// empty-cursor sentinel, as if its `OPTIONAL`/`CHOICE` branch had never
    /// been present on the wire. Returns `false` if `path` does not resolve
    /// to a slot-bearing field, or is not itself a [`Recipe::Named`] path.
    pub fn clear(&mut self, path: &str) -> bool {
        let slot = match resolve_path(self.recipe, path) {
            Some(Recipe::Leaf(slot) | Recipe::Repeated { slot, .. } | Recipe::TypeRef { slot, .. }) => *slot,
            _ => return false,
        };
        self.cursors.set(slot, Cursor::EMPTY);
        true
    }

    /// Splits a `Repeated` field at `path` into its elements' own raw TLV
    /// bytes (each still carrying its own tag/length), ready to be edited
    /// and handed back to [`Document::set_repeated`]. Empty if the field is
    /// absent or `path` does not resolve to a [`Recipe::Repeated`] field.
    pub fn repeated_bodies(&self, path: &str) -> Result<Vec<Vec<u8>>, DecodeError> {
        let Some(Recipe::Repeated { slot, .. }) = resolve_path(self.recipe, path) else {
            return Ok(Vec::new());
        };
        let Some(cursor) = self.cursors.get(*slot) else { return Ok(Vec::new()) };
        if cursor.is_empty() {
            return Ok(Vec::new());
        }
        let body = cursor.slice(&self.buffer);
        let mut out = Vec::new();
        let mut pos = 0usize;
        while pos < body.len() {
            let header = parse_header(&body[pos..])?;
            let total = header.header_length + header.body_length;
            out.push(body[pos..pos + total].to_vec());
            pos += total;
        }
        Ok(out)
    }

    /// Re-materializes a `Repeated` field at `path` from `element_tlvs`
    /// (each a complete, independently-headered element TLV, in the order
    /// they should be re-packed). Appends the concatenation to the
    /// document's buffer and marks the slot opaque/constructed, matching
    /// how the original `STORE|SEQUENCE`/`STORE|SET` capture was framed.
    /// Returns `false` if `path` does not resolve to a [`Recipe::Repeated`]
    /// field.
    pub fn set_repeated(&mut self, path: &str, element_tlvs: &[Vec<u8>]) -> bool {
        let Some(Recipe::Repeated { slot, .. }) = resolve_path(self.recipe, path) else { return false };
        let slot = *slot;
        let offset = self.buffer.len();
        let mut length = 0usize;
        for tlv in element_tlvs {
            self.buffer.extend_from_slice(tlv);
            length += tlv.len();
        }
        self.cursors.set(slot, Cursor::new_opaque(offset, length));
        true
    }
}

/// Unpacks `input` with `program` and wraps the result as a mutable
/// [`Document`], taking ownership of the bytes so later mutations can append
/// to them freely.
pub fn decode_document(program: &[u8], recipe: &'static Recipe, input: &[u8]) -> Result<Document, DecodeError> {
    let cursors = unpack(program, input)?;
    Ok(Document::new(input.to_vec(), cursors, recipe))
}
