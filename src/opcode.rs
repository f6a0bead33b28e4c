//! The packer-program opcode alphabet.
//!
//! A packer program is a flat `&[u8]` of opcodes. Structurally it is a
//! sequence of *statements*; each statement is one of:
//!
//! - `STORE|tag` or `ANY` — a single leaf slot. `STORE` covers both an
//!   ordinary primitive leaf and a `SEQUENCE OF`/`SET OF` field's opaque
//!   body (`STORE|SEQUENCE`/`STORE|SET`, spec.md §4.6); unlike `ENTER`, it
//!   does not require a particular wire form — see [`crate::cursor::Cursor`].
//! - `ENTER|tag <statement>* LEAVE` — a constructed value.
//! - `OPTIONAL <statement>` — the wrapped statement may be absent.
//! - `CHOICE_BEGIN <statement>+ CHOICE_END` — exactly one alternative present.
//!
//! `LEAVE` and `END` share the byte `0x00`; `CHOICE_BEGIN` and `CHOICE_END`
//! share `0x1F`. Both interpreters (and the `skip`/`count_slots` helpers
//! below) resolve the ambiguity purely from grammar position: `0x00`/`0x1F`
//! is only ever read where a *closer* is expected (the end of an `ENTER`
//! region or a `CHOICE` block), never where a new statement is expected to
//! start — so no separate "parity" bookkeeping is needed.

use crate::tag::Tag;

/// `CHOICE_BEGIN` / `CHOICE_END` — disambiguated by grammar position.
pub const CHOICE_BRACKET: u8 = 0x1F;
/// `LEAVE` / `END` — disambiguated by grammar position.
pub const SCOPE_CLOSE: u8 = 0x00;
pub const OPTIONAL: u8 = 0x3F;
pub const ANY: u8 = 0xDF;

const CONSTRUCTED_BIT: u8 = 0x20;

/// One decoded opcode, with the `SCOPE_CLOSE`/`CHOICE_BRACKET` ambiguity
/// still unresolved (the caller knows, from its own recursion state, which
/// of the two meanings applies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Enter(Tag),
    Store(Tag),
    Optional,
    ChoiceBracket,
    Any,
    ScopeClose,
}

/// Decodes the opcode at `program[pc]`.
///
/// # Panics
/// If `pc` is out of bounds. Packer programs are trusted build-time
/// artefacts produced by the compiler (C6), not untrusted input — an
/// out-of-bounds read here is an internal invariant violation, not a
/// reportable runtime error.
pub fn decode(program: &[u8], pc: usize) -> Op {
    let byte = program[pc];
    match byte {
        SCOPE_CLOSE => Op::ScopeClose,
        CHOICE_BRACKET => Op::ChoiceBracket,
        OPTIONAL => Op::Optional,
        ANY => Op::Any,
        _ => {
            let class = crate::tag::Class::from_bits(byte >> 6);
            let number = byte & 0x1f;
            let tag = Tag::new(class, number);
            if byte & CONSTRUCTED_BIT != 0 {
                Op::Enter(tag)
            } else {
                Op::Store(tag)
            }
        }
    }
}

/// Encodes an `ENTER|tag` opcode byte.
pub const fn enter(tag: Tag) -> u8 {
    tag.identifier_octet(true) | CONSTRUCTED_BIT
}

/// Encodes a `STORE|tag` opcode byte.
pub const fn store(tag: Tag) -> u8 {
    tag.identifier_octet(false) & !CONSTRUCTED_BIT
}

/// Returns the index just past the single statement starting at `pc`
/// (`STORE`/`ANY` site, `ENTER...LEAVE` region, `OPTIONAL <stmt>`, or
/// `CHOICE_BEGIN...CHOICE_END`), without interpreting any input bytes.
///
/// Used to skip a non-taken `OPTIONAL` or `CHOICE` alternative.
pub fn skip_statement(program: &[u8], pc: usize) -> usize {
    match decode(program, pc) {
        Op::Store(_) | Op::Any => pc + 1,
        Op::Enter(_) => {
            let mut cursor = pc + 1;
            loop {
                if decode(program, cursor) == Op::ScopeClose {
                    break cursor + 1;
                }
                cursor = skip_statement(program, cursor);
            }
        }
        Op::Optional => skip_statement(program, pc + 1),
        Op::ChoiceBracket => {
            let mut cursor = pc + 1;
            loop {
                if decode(program, cursor) == Op::ChoiceBracket {
                    break cursor + 1;
                }
                cursor = skip_statement(program, cursor);
            }
        }
        Op::ScopeClose => pc + 1,
    }
}

/// Counts how many `STORE`/`ANY` slots the single statement starting at
/// `pc` would contribute, including slots nested inside `ENTER`/`CHOICE`
/// regions. Used to zero the right number of cursor-array slots when an
/// `OPTIONAL`/`CHOICE` branch is not taken.
pub fn count_slots(program: &[u8], pc: usize) -> usize {
    match decode(program, pc) {
        Op::Store(_) | Op::Any => 1,
        Op::Enter(_) => {
            let mut cursor = pc + 1;
            let mut slots = 0;
            loop {
                if decode(program, cursor) == Op::ScopeClose {
                    break slots;
                }
                slots += count_slots(program, cursor);
                cursor = skip_statement(program, cursor);
            }
        }
        Op::Optional => count_slots(program, pc + 1),
        Op::ChoiceBracket => {
            let mut cursor = pc + 1;
            let mut slots = 0;
            loop {
                if decode(program, cursor) == Op::ChoiceBracket {
                    break slots;
                }
                slots += count_slots(program, cursor);
                cursor = skip_statement(program, cursor);
            }
        }
        Op::ScopeClose => 0,
    }
}

/// Whether the statement at `pc` could legally begin with `tag` as its
/// outermost identifier octet. `ANY` always matches (it is the wildcard
/// alternative); a nested `CHOICE` matches if any of its alternatives do.
/// Used to decide `OPTIONAL` presence and to pick a `CHOICE` alternative
///
pub fn could_start_with(program: &[u8], pc: usize, tag: Tag) -> bool {
    match decode(program, pc) {
        Op::Store(t) | Op::Enter(t) => t == tag,
        Op::Any => true,
        Op::Optional => could_start_with(program, pc + 1, tag),
        Op::ChoiceBracket => {
            let mut cursor = pc + 1;
            loop {
                match decode(program, cursor) {
                    Op::ChoiceBracket => break false,
                    _ if could_start_with(program, cursor, tag) => break true,
                    _ => cursor = skip_statement(program, cursor),
                }
            }
        }
        Op::ScopeClose => false,
    }
}

/// The static cursor count of a whole program (the number of `STORE`/`ANY`
/// slots reachable before the top-level `END`).
pub fn cursor_count(program: &[u8]) -> usize {
    let mut cursor = 0;
    let mut slots = 0;
    while decode(program, cursor) != Op::ScopeClose {
        slots += count_slots(program, cursor);
        cursor = skip_statement(program, cursor);
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_store_round_trip_through_tables() {
        assert_eq!(decode(&[enter(Tag::SEQUENCE)], 0), Op::Enter(Tag::SEQUENCE));
        assert_eq!(decode(&[store(Tag::OCTET_STRING)], 0), Op::Store(Tag::OCTET_STRING));
        assert_eq!(decode(&[enter(Tag::context(0))], 0), Op::Enter(Tag::context(0)));
        assert_eq!(decode(&[store(Tag::private(5))], 0), Op::Store(Tag::private(5)));
    }

    #[test]
    fn control_opcodes_match_the_normative_table() {
        assert_eq!(decode(&[0x00], 0), Op::ScopeClose);
        assert_eq!(decode(&[0x1f], 0), Op::ChoiceBracket);
        assert_eq!(decode(&[0x3f], 0), Op::Optional);
        assert_eq!(decode(&[0xdf], 0), Op::Any);
    }

    #[test]
    fn seed_vector_b_program_shape() {
        // ENTER|SEQUENCE, STORE|OCTET_STRING, STORE|OCTET_STRING, END
        let program = [
            enter(Tag::SEQUENCE),
            store(Tag::OCTET_STRING),
            store(Tag::OCTET_STRING),
            SCOPE_CLOSE, // LEAVE (closes the SEQUENCE)
            SCOPE_CLOSE, // END (closes the program)
        ];
        assert_eq!(cursor_count(&program), 2);
    }

    #[test]
    fn skip_over_nested_choice_inside_sequence() {
        // SEQUENCE { CHOICE { STORE a, ENTER b .. LEAVE } }
        let program = [
            enter(Tag::SEQUENCE),
            CHOICE_BRACKET,
            store(Tag::context(0)),
            enter(Tag::context(1)),
            store(Tag::INTEGER),
            SCOPE_CLOSE, // LEAVE (closes ctx1)
            CHOICE_BRACKET, // CHOICE_END
            SCOPE_CLOSE, // LEAVE (closes the SEQUENCE)
            SCOPE_CLOSE, // END (closes the program)
        ];
        assert_eq!(cursor_count(&program), 2);
        assert_eq!(skip_statement(&program, 0), program.len() - 1);
    }
}
