// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared text utilities for the preprocessor scanners.

/// Check if a byte is a valid identifier start character (letter or underscore).
#[inline]
pub fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Check if a byte is a valid identifier continuation character.
#[inline]
pub fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Sigils that may precede an identifier (`.label`, `#imm`, `$sym`, ...).
#[inline]
pub fn is_ident_prefix(c: u8) -> bool {
    matches!(c, b'.' | b'#' | b'$' | b'%' | b'@')
}

/// Whitespace other than the line terminator.
#[inline]
pub fn is_blank(c: u8) -> bool {
    c != b'\n' && c.is_ascii_whitespace()
}

/// Remove trailing whitespace, newlines included.
pub fn chomp(buf: &mut Vec<u8>) {
    while buf.last().is_some_and(|c| c.is_ascii_whitespace()) {
        buf.pop();
    }
}

/// A byte cursor over one piece of text. Copying a cursor gives a
/// lookahead that can be committed by assigning it back.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the start of the input.
    pub fn new(input: &'a str) -> Self {
        Self::from_bytes(input.as_bytes())
    }

    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Get the current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Peek at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Peek `offset` bytes ahead of the current position.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Consume and return the current byte.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.bytes.len());
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// End of text, comment start or line end.
    pub fn at_end_of_statement(&self) -> bool {
        matches!(self.peek(), None | Some(b';') | Some(b'\n'))
    }

    /// Skip blanks, stopping at a newline.
    pub fn skip_blanks(&mut self) {
        while self.peek().is_some_and(is_blank) {
            self.pos += 1;
        }
    }

    /// Bytes from the current position to the end.
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    /// Bytes from `start` up to the current position.
    pub fn since(&self, start: usize) -> &'a [u8] {
        &self.bytes[start..self.pos]
    }

    /// Move to the end of the text.
    pub fn skip_to_end(&mut self) {
        self.pos = self.bytes.len();
    }

    /// Consume `word` (ASCII case-insensitive) when it is not followed by
    /// another identifier character.
    pub fn eat_word(&mut self, word: &str) -> bool {
        let len = word.len();
        let Some(candidate) = self.bytes.get(self.pos..self.pos + len) else {
            return false;
        };
        if !candidate.eq_ignore_ascii_case(word.as_bytes()) {
            return false;
        }
        if self.peek_at(len).is_some_and(is_ident_char) {
            return false;
        }
        self.pos += len;
        true
    }

    /// Skip blanks, then consume a name with an optional one-character
    /// prefix: `[.#$%@]?[A-Za-z_][A-Za-z0-9_]*`.
    pub fn take_name(&mut self) -> Option<String> {
        let mut probe = *self;
        probe.skip_blanks();
        let start = probe.pos;
        match (probe.peek(), probe.peek_at(1)) {
            (Some(prefix), Some(first)) if is_ident_prefix(prefix) && is_ident_start(first) => {
                probe.pos += 2;
            }
            (Some(first), _) if is_ident_start(first) => {
                probe.pos += 1;
            }
            _ => return None,
        }
        while probe.peek().is_some_and(is_ident_char) {
            probe.pos += 1;
        }
        let name = probe.since(start).iter().copied().map(char::from).collect();
        *self = probe;
        Some(name)
    }
}
