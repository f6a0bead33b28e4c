//! The pack interpreter (C4): walks a packer program against a
//! [`CursorArray`], producing DER output bytes.
//!
//! A constructed value's header cannot be emitted until its body length is
//! known, so each `ENTER` region is built bottom-up: child statements are
//! rendered into an owned buffer first, and the header is only written once
//! that buffer's final length is in hand.

use alloc::vec::Vec;

use crate::cursor::CursorArray;
use crate::error::encode::{CursorCountMismatchSnafu, CustomSnafu, MissingRequiredSnafu, OverflowLengthSnafu};
use crate::error::EncodeError;
use crate::header::emit_header;
use crate::opcode::{self, Op};

/// Interprets `program` against `cursors` (whose spans are read from
/// `input`), producing canonical DER bytes.
///
/// Fails with [`EncodeError::CursorCountMismatch`] if `cursors` was not
/// produced for this program, [`EncodeError::MissingRequired`] if a
/// non-`OPTIONAL` slot holds [`crate::cursor::Cursor::EMPTY`], and
/// [`EncodeError::Custom`] if no `CHOICE` alternative has a value.
pub fn pack(program: &[u8], cursors: &CursorArray, input: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let expected = opcode::cursor_count(program);
    if cursors.len() != expected {
        return CursorCountMismatchSnafu { expected, actual: cursors.len() }.fail();
    }
    let mut out = Vec::new();
    let mut pc = 0usize;
    let mut slot = 0usize;
    loop {
        if opcode::decode(program, pc) == Op::ScopeClose {
            break;
        }
        let mut piece = statement(program, &mut pc, cursors, input, &mut slot)?;
        out.append(&mut piece);
    }
    Ok(out)
}

fn statement(
    program: &[u8],
    pc: &mut usize,
    cursors: &CursorArray,
    input: &[u8],
    slot: &mut usize,
) -> Result<Vec<u8>, EncodeError> {
    match opcode::decode(program, *pc) {
        Op::Store(tag) => {
            let cursor = cursors.get(*slot).expect("cursor array sized by cursor_count");
            *slot += 1;
            *pc += 1;
            if cursor.is_empty() {
                return MissingRequiredSnafu { tag }.fail();
            }
            let body = cursor.slice(input);
            let mut out = emit_header(tag, cursor.is_constructed(), body.len());
            out.extend_from_slice(body);
            Ok(out)
        }
        Op::Any => {
            let cursor = cursors.get(*slot).expect("cursor array sized by cursor_count");
            *slot += 1;
            *pc += 1;
            if cursor.is_empty() {
                return CustomSnafu { msg: "ANY slot has no captured value" }.fail();
            }
            Ok(cursor.slice(input).to_vec())
        }
        Op::Enter(tag) => {
            *pc += 1;
            let mut body = Vec::new();
            let mut body_len = 0usize;
            loop {
                if opcode::decode(program, *pc) == Op::ScopeClose {
                    *pc += 1;
                    break;
                }
                let piece = statement(program, pc, cursors, input, slot)?;
                body_len = body_len
                    .checked_add(piece.len())
                    .ok_or_else(|| OverflowLengthSnafu.build())?;
                body.extend(piece);
            }
            let mut out = emit_header(tag, true, body_len);
            out.extend(body);
            Ok(out)
        }
        Op::Optional => {
            *pc += 1;
            if is_present(program, *pc, cursors, *slot) {
                statement(program, pc, cursors, input, slot)
            } else {
                skip(program, pc, slot);
                Ok(Vec::new())
            }
        }
        Op::ChoiceBracket => {
            *pc += 1;
            let mut chosen = None;
            loop {
                if opcode::decode(program, *pc) == Op::ChoiceBracket {
                    *pc += 1;
                    break;
                }
                if chosen.is_none() && is_present(program, *pc, cursors, *slot) {
                    chosen = Some(statement(program, pc, cursors, input, slot)?);
                } else {
                    skip(program, pc, slot);
                }
            }
            chosen.ok_or_else(|| CustomSnafu { msg: "no CHOICE alternative had a value" }.build())
        }
        Op::ScopeClose => Ok(Vec::new()),
    }
}

/// Whether the statement at `pc`, if its slots start at `slot`, has at
/// least one populated leaf cursor. Does not mutate any counters — used to
/// decide `OPTIONAL` presence and `CHOICE` alternative selection before
/// committing to walk a branch.
fn is_present(program: &[u8], pc: usize, cursors: &CursorArray, slot: usize) -> bool {
    match opcode::decode(program, pc) {
        Op::Store(_) | Op::Any => cursors.get(slot).is_some_and(|c| !c.is_empty()),
        Op::Enter(_) => {
            let mut inner_pc = pc + 1;
            let mut inner_slot = slot;
            let mut any = false;
            while opcode::decode(program, inner_pc) != Op::ScopeClose {
                any |= is_present(program, inner_pc, cursors, inner_slot);
                inner_slot += opcode::count_slots(program, inner_pc);
                inner_pc = opcode::skip_statement(program, inner_pc);
            }
            any
        }
        Op::Optional => is_present(program, pc + 1, cursors, slot),
        Op::ChoiceBracket => {
            let mut inner_pc = pc + 1;
            let mut inner_slot = slot;
            let mut any = false;
            while opcode::decode(program, inner_pc) != Op::ChoiceBracket {
                any |= is_present(program, inner_pc, cursors, inner_slot);
                inner_slot += opcode::count_slots(program, inner_pc);
                inner_pc = opcode::skip_statement(program, inner_pc);
            }
            any
        }
        Op::ScopeClose => false,
    }
}

/// Advances `*pc` past the statement at `*pc` and `*slot` past its reserved
/// slot range, without emitting anything (a non-taken `OPTIONAL`/`CHOICE`
/// branch).
fn skip(program: &[u8], pc: &mut usize, slot: &mut usize) {
    *slot += opcode::count_slots(program, *pc);
    *pc = opcode::skip_statement(program, *pc);
}
