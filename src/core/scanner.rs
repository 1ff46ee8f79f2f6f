// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Lexeme classifiers shared by the expander and the statement splitter.
//!
//! A classifier looks at the cursor, and on a match consumes the lexeme and
//! appends its spelling to the output buffer. On no match neither the cursor
//! nor the buffer is touched, so callers can try classifiers in turn. The
//! classifiers that may trigger macro expansion live with the expander.

use crate::core::text_utils::{chomp, Cursor};

/// Outcome of one classifier attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    Matched,
    Unmatched,
}

impl Scan {
    pub fn is_match(self) -> bool {
        self == Scan::Matched
    }

    /// Try the next classifier only when this one did not match.
    pub fn or_else(self, next: impl FnOnce() -> Scan) -> Scan {
        match self {
            Scan::Matched => Scan::Matched,
            Scan::Unmatched => next(),
        }
    }
}

/// Copy one byte through unchanged.
pub fn copy_byte(cursor: &mut Cursor<'_>, out: &mut Vec<u8>) {
    if let Some(c) = cursor.next() {
        out.push(c);
    }
}

/// Numeric literal in any of the accepted radix notations.
pub fn scan_number(cursor: &mut Cursor<'_>, out: &mut Vec<u8>) -> Scan {
    let Some(len) = number_len(cursor.rest()) else {
        return Scan::Unmatched;
    };
    out.extend_from_slice(&cursor.rest()[..len]);
    cursor.advance(len);
    Scan::Matched
}

fn number_len(text: &[u8]) -> Option<usize> {
    let first = *text.first()?;
    let second = text.get(1).copied();
    let radix_mark = second.map(|c| c.to_ascii_lowercase());

    match (first, radix_mark) {
        (b'0', Some(b'x')) => Some(2 + run_len(&text[2..], |c| c.is_ascii_hexdigit())),
        (b'0', Some(b'b')) => Some(2 + run_len(&text[2..], |c| matches!(c, b'0' | b'1'))),
        (b'0', Some(b'o' | b'q')) => Some(2 + run_len(&text[2..], |c| matches!(c, b'0'..=b'7'))),
        (b'$' | b'#', _) if second.is_some_and(|c| c.is_ascii_hexdigit()) => {
            let len = 1 + run_len(&text[1..], |c| c.is_ascii_alphanumeric());
            (max_digit(&text[1..len]) <= b'f').then_some(len)
        }
        (b'%' | b'@', _) if matches!(second, Some(b'0' | b'1')) => {
            let len = 1 + run_len(&text[1..], |c| c.is_ascii_alphanumeric());
            (max_digit(&text[1..len]) <= b'1').then_some(len)
        }
        (c, _) if c.is_ascii_digit() => {
            let len = run_len(text, |c| c.is_ascii_alphanumeric());
            let run = &text[..len];
            (max_digit(run) <= b'9' || is_hex_with_suffix(run)).then_some(len)
        }
        _ => None,
    }
}

fn run_len(text: &[u8], accept: impl Fn(u8) -> bool) -> usize {
    text.iter().take_while(|&&c| accept(c)).count()
}

/// Highest digit seen, letters folded to lower case.
fn max_digit(run: &[u8]) -> u8 {
    run.iter()
        .map(|c| c.to_ascii_lowercase())
        .fold(b'0', u8::max)
}

/// `0FFh`: hex digits closed by an `h` suffix.
fn is_hex_with_suffix(run: &[u8]) -> bool {
    match run.split_last() {
        Some((last, digits)) => {
            last.eq_ignore_ascii_case(&b'h')
                && !digits.is_empty()
                && digits.iter().all(u8::is_ascii_hexdigit)
        }
        None => false,
    }
}

/// Single- or double-quoted string. A backslash copies the next byte
/// unchecked; a missing close quote runs to the end of the text.
pub fn scan_quoted(cursor: &mut Cursor<'_>, out: &mut Vec<u8>) -> Scan {
    let quote = match cursor.peek() {
        Some(q @ (b'\'' | b'"')) => q,
        _ => return Scan::Unmatched,
    };
    let start = cursor.pos();
    cursor.next();
    while let Some(c) = cursor.next() {
        if c == quote {
            break;
        }
        if c == b'\\' {
            cursor.next();
        }
    }
    out.extend_from_slice(cursor.since(start));
    Scan::Matched
}

/// `##`: drop the blanks on both sides so the neighbours join.
pub fn scan_paste(cursor: &mut Cursor<'_>, out: &mut Vec<u8>) -> Scan {
    if cursor.peek() != Some(b'#') || cursor.peek_at(1) != Some(b'#') {
        return Scan::Unmatched;
    }
    cursor.advance(2);
    cursor.skip_blanks();
    chomp(out);
    Scan::Matched
}
