// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Statement splitting and `EQU`/`=` translation.
//!
//! A source line may hold several statements separated by `\` or by a `:`
//! that is neither a label marker nor part of a `?:` expression. Each
//! statement is macro-expanded, split at the newlines its expansion may
//! contain and queued for the assembler.

use crate::core::preprocess::Preprocessor;
use crate::core::scanner::{copy_byte, scan_number, scan_paste, scan_quoted};
use crate::core::text_utils::{is_ident_start, Cursor};

/// Counters that decide what a `:` means in the current statement.
#[derive(Debug, Default)]
struct SplitState {
    open_questions: usize,
    idents: usize,
    last_was_ident: bool,
}

impl SplitState {
    fn colon_is_label_marker(&self) -> bool {
        self.last_was_ident && self.idents == 1
    }
}

impl Preprocessor {
    pub(crate) fn expand_statements(&mut self, line: &[u8]) {
        let mut cursor = Cursor::from_bytes(line);
        let mut out = Vec::new();
        let mut state = SplitState::default();

        while !cursor.is_at_end() {
            if scan_number(&mut cursor, &mut out).is_match() {
                state.last_was_ident = false;
                continue;
            }
            if self.scan_macro_call(&mut cursor, &mut out).is_match() {
                state.idents += 1;
                state.last_was_ident = true;
                continue;
            }
            let matched = scan_quoted(&mut cursor, &mut out)
                .or_else(|| scan_paste(&mut cursor, &mut out))
                .or_else(|| self.scan_stringize(&mut cursor, &mut out));
            if matched.is_match() {
                state.last_was_ident = false;
                continue;
            }

            match cursor.peek() {
                Some(b';') => {
                    out.push(b'\n');
                    cursor.skip_to_end();
                }
                Some(b'\\') => {
                    cursor.next();
                    self.split_statement(&mut out, &mut state);
                }
                Some(b'?') => {
                    copy_byte(&mut cursor, &mut out);
                    state.open_questions += 1;
                }
                Some(b':') if state.open_questions > 0 => {
                    copy_byte(&mut cursor, &mut out);
                    state.open_questions -= 1;
                }
                Some(b':') if state.colon_is_label_marker() => copy_byte(&mut cursor, &mut out),
                Some(b':') => {
                    cursor.next();
                    self.split_statement(&mut out, &mut state);
                }
                _ => copy_byte(&mut cursor, &mut out),
            }
            state.last_was_ident = false;
        }
        self.send_to_output(&out);
    }

    /// Close the statement collected so far and start counting afresh.
    fn split_statement(&mut self, out: &mut Vec<u8>, state: &mut SplitState) {
        out.push(b'\n');
        self.send_to_output(out);
        out.clear();
        *state = SplitState::default();
    }

    /// Queue every newline-terminated piece of `text`, plus an unterminated
    /// tail if there is one.
    fn send_to_output(&mut self, text: &[u8]) {
        for piece in text.split_inclusive(|&c| c == b'\n') {
            self.translate(piece);
        }
    }

    fn translate(&mut self, piece: &[u8]) {
        let statement = self
            .rewrite_assignment(piece)
            .unwrap_or_else(|| piece.to_vec());
        if !statement.is_empty() {
            self.queue_statement(statement);
        }
    }

    /// `NAME EQU expr`, `NAME = expr` (with optional `.` prefix or `:`
    /// suffix on the name) become `defc NAME = expr`. Also tracks
    /// `defgroup { ... }` blocks, whose member assignments stay untouched.
    fn rewrite_assignment(&mut self, piece: &[u8]) -> Option<Vec<u8>> {
        let mut cursor = Cursor::from_bytes(piece);

        if self.in_defgroup {
            self.in_defgroup = !closes_defgroup(cursor);
            return None;
        }

        let mut name = cursor.take_name()?;
        if name.eq_ignore_ascii_case("defgroup") {
            self.in_defgroup = !closes_defgroup(cursor);
            return None;
        }

        if let Some(stripped) = name.strip_prefix('.') {
            name = stripped.to_string();
        } else if cursor.peek() == Some(b':') {
            cursor.next();
        }
        cursor.skip_blanks();

        let is_assignment = if cursor.peek() == Some(b'=') {
            cursor.next();
            true
        } else {
            cursor.peek().is_some_and(is_ident_start) && cursor.eat_word("equ")
        };
        if !is_assignment {
            return None;
        }

        cursor.skip_blanks();
        tracing::trace!(name = %name, "assignment rewritten to defc");
        let mut rewritten = format!("defc {name} = ").into_bytes();
        rewritten.extend_from_slice(cursor.rest());
        Some(rewritten)
    }
}

/// True when a `}` shows up before any comment.
fn closes_defgroup(mut cursor: Cursor<'_>) -> bool {
    while !cursor.is_at_end() && cursor.peek() != Some(b';') {
        if cursor.next() == Some(b'}') {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use crate::core::input::InputStack;
    use crate::core::preprocess::Preprocessor;

    fn statements(text: &str) -> Vec<String> {
        let mut pp = Preprocessor::new();
        let mut input = InputStack::new(pp.pool().clone());
        input.push();
        input.open_text("split.asm", text).unwrap();
        let mut out = Vec::new();
        while let Some(statement) = pp.macro_getline(&mut input) {
            out.push(String::from_utf8(statement).unwrap());
        }
        assert!(pp.errors().is_empty());
        out
    }

    #[test]
    fn backslash_splits_statements() {
        assert_eq!(statements("a: nop \\ b: nop\n"), vec!["a: nop \n", " b: nop\n"]);
    }

    #[test]
    fn label_colon_is_kept() {
        assert_eq!(statements("start: ld a, 1\n"), vec!["start: ld a, 1\n"]);
        assert_eq!(statements(".loop: djnz loop\n"), vec![".loop: djnz loop\n"]);
    }

    #[test]
    fn colon_after_instruction_splits() {
        assert_eq!(
            statements("ld a, 1 : ld b, 2\n"),
            vec!["ld a, 1 \n", " ld b, 2\n"]
        );
        assert_eq!(statements("lbl: nop : ret\n"), vec!["lbl: nop \n", " ret\n"]);
    }

    #[test]
    fn ternary_colon_does_not_split() {
        assert_eq!(
            statements("ld a, x ? 1 : 2\n"),
            vec!["ld a, x ? 1 : 2\n"]
        );
    }

    #[test]
    fn split_resets_label_counting() {
        assert_eq!(
            statements("nop \\ here: ret\n"),
            vec!["nop \n", " here: ret\n"]
        );
    }

    #[test]
    fn equ_and_equals_become_defc() {
        assert_eq!(statements("FOO EQU 5\n"), vec!["defc FOO = 5\n"]);
        assert_eq!(statements("FOO = 5\n"), vec!["defc FOO = 5\n"]);
        assert_eq!(statements("bar: equ 2*3 ; six\n"), vec!["defc bar = 2*3 \n"]);
        assert_eq!(statements(".baz = 1\n"), vec!["defc baz = 1\n"]);
        assert_eq!(statements("FOO equate 5\n"), vec!["FOO equate 5\n"]);
    }

    #[test]
    fn defc_rewrite_keeps_expression_bytes() {
        let mut pp = Preprocessor::new();
        let mut input = InputStack::new(pp.pool().clone());
        input.push();
        input.open_text("equ.asm", b"CH EQU '\xA3'\n".to_vec()).unwrap();
        assert_eq!(
            pp.macro_getline(&mut input),
            Some(b"defc CH = '\xA3'\n".to_vec())
        );
    }

    #[test]
    fn defgroup_members_are_not_rewritten() {
        assert_eq!(
            statements("defgroup {\nA = 1\nB\n}\nC = 2\n"),
            vec!["defgroup {\n", "A = 1\n", "B\n", "}\n", "defc C = 2\n"]
        );
        assert_eq!(
            statements("DEFGROUP { X = 1 }\nY = 2\n"),
            vec!["DEFGROUP { X = 1 }\n", "defc Y = 2\n"]
        );
    }
}
