//! The unpack interpreter (C3): walks a packer program against DER input
//! bytes, producing a [`CursorArray`].
//!
//! Failure is atomic: if any statement fails, the partially-filled cursor
//! array is discarded rather than returned — callers only ever see a
//! complete array or an error.

use crate::cursor::{Cursor, CursorArray};
use crate::error::decode::{
    ChoiceNoMatchSnafu, EncodingFormMismatchSnafu, MissingRequiredSnafu, TagMismatchSnafu,
    TrailingGarbageSnafu,
};
use crate::error::DecodeError;
use crate::header::parse_header;
use crate::opcode::{self, Op};

/// Interprets `program` against `input`, producing one cursor per
/// `STORE`/`ANY` site (populated, or [`Cursor::EMPTY`] for a skipped
/// `OPTIONAL`/`CHOICE` branch).
///
/// Fails with [`DecodeError::TrailingGarbage`] if bytes remain after the
/// program's top-level `END`.
pub fn unpack(program: &[u8], input: &[u8]) -> Result<CursorArray, DecodeError> {
    let mut cursors = CursorArray::with_capacity(opcode::cursor_count(program));
    let mut slot = 0usize;
    let mut pc = 0usize;
    let mut pos = 0usize;
    loop {
        match opcode::decode(program, pc) {
            Op::ScopeClose => break,
            _ => pos = statement(program, &mut pc, input, pos, input.len(), &mut slot, &mut cursors)?,
        }
    }
    if pos != input.len() {
        return TrailingGarbageSnafu { count: input.len() - pos }.fail();
    }
    Ok(cursors)
}

/// Interprets the single statement at `*pc`, consuming `input[pos..end]`.
/// Returns the position just past the bytes consumed, and advances `*pc`
/// past the statement.
fn statement(
    program: &[u8],
    pc: &mut usize,
    input: &[u8],
    pos: usize,
    end: usize,
    slot: &mut usize,
    cursors: &mut CursorArray,
) -> Result<usize, DecodeError> {
    match opcode::decode(program, *pc) {
        Op::Store(tag) => {
            if pos >= end {
                return MissingRequiredSnafu { tag }.fail();
            }
            let header = parse_header(&input[pos..end])?;
            if header.tag != tag {
                return TagMismatchSnafu { expected: tag, actual: header.tag }.fail();
            }
            // Unlike `ENTER`, `STORE` does not require a particular wire
            // form: ordinary leaves are primitive, but a `SEQUENCE OF`/`SET
            // OF` field also compiles to a `STORE` (of `SEQUENCE`/`SET`,
            // spec.md §4.6) over a body that is always constructed. The
            // cursor remembers which form was actually present so `pack`
            // can reproduce it without having to re-derive it from `tag`
            // (which an `IMPLICIT` override may have replaced).
            let body_start = pos + header.header_length;
            let cursor = if header.constructed {
                Cursor::new_opaque(body_start, header.body_length)
            } else {
                Cursor::new(body_start, header.body_length)
            };
            cursors.set(*slot, cursor);
            *slot += 1;
            *pc += 1;
            Ok(body_start + header.body_length)
        }
        Op::Any => {
            let header = parse_header(&input[pos..end])?;
            let total = header.header_length + header.body_length;
            cursors.set(*slot, Cursor::new(pos, total));
            *slot += 1;
            *pc += 1;
            Ok(pos + total)
        }
        Op::Enter(tag) => {
            if pos >= end {
                return MissingRequiredSnafu { tag }.fail();
            }
            let header = parse_header(&input[pos..end])?;
            if header.tag != tag {
                return TagMismatchSnafu { expected: tag, actual: header.tag }.fail();
            }
            if !header.constructed {
                return EncodingFormMismatchSnafu { tag, expected_constructed: true }.fail();
            }
            *pc += 1;
            let body_start = pos + header.header_length;
            let body_end = body_start + header.body_length;
            let mut inner = body_start;
            loop {
                if opcode::decode(program, *pc) == Op::ScopeClose {
                    *pc += 1;
                    break;
                }
                inner = statement(program, pc, input, inner, body_end, slot, cursors)?;
            }
            if inner != body_end {
                return TrailingGarbageSnafu { count: body_end - inner }.fail();
            }
            Ok(body_end)
        }
        Op::Optional => {
            *pc += 1;
            let present = pos < end
                && parse_header(&input[pos..end])
                    .map(|header| opcode::could_start_with(program, *pc, header.tag))
                    .unwrap_or(false);
            if present {
                statement(program, pc, input, pos, end, slot, cursors)
            } else {
                zero_fill(program, pc, slot, cursors);
                Ok(pos)
            }
        }
        Op::ChoiceBracket => {
            *pc += 1;
            let peeked = if pos < end { Some(parse_header(&input[pos..end])?) } else { None };
            let mut next = pos;
            let mut matched = false;
            loop {
                if opcode::decode(program, *pc) == Op::ChoiceBracket {
                    *pc += 1;
                    break;
                }
                let is_match = !matched
                    && peeked.is_some_and(|h| opcode::could_start_with(program, *pc, h.tag));
                if is_match {
                    matched = true;
                    next = statement(program, pc, input, pos, end, slot, cursors)?;
                } else {
                    zero_fill(program, pc, slot, cursors);
                }
            }
            if !matched {
                return ChoiceNoMatchSnafu.fail();
            }
            Ok(next)
        }
        Op::ScopeClose => Ok(pos),
    }
}

/// Writes [`Cursor::EMPTY`] for every slot the statement at `*pc` would have
/// populated, and advances `*pc` past it, without consuming any input.
fn zero_fill(program: &[u8], pc: &mut usize, slot: &mut usize, cursors: &mut CursorArray) {
    let count = opcode::count_slots(program, *pc);
    for _ in 0..count {
        cursors.set(*slot, Cursor::EMPTY);
        *slot += 1;
    }
    *pc = opcode::skip_statement(program, *pc);
}
