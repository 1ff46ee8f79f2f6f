// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// `#define`, `#defcont` and `#undef`.

use crate::core::error::PreprocessError;
use crate::core::input::LineSource;
use crate::core::preprocess::Preprocessor;
use crate::core::scanner::{copy_byte, scan_quoted};
use crate::core::strpool::Atom;
use crate::core::text_utils::{chomp, Cursor};

impl Preprocessor {
    /// Handle `line` when it is a directive. Every line with `#` in the
    /// first column is consumed; unknown directives are dropped silently.
    pub(crate) fn parse_directive(&mut self, line: &[u8], source: &mut dyn LineSource) -> bool {
        let mut cursor = Cursor::from_bytes(line);
        if cursor.next() != Some(b'#') {
            return false;
        }

        if cursor.eat_word("define") {
            self.parse_define(&mut cursor, source);
        } else if cursor.eat_word("undef") {
            self.parse_undef(&mut cursor);
        } else if cursor.eat_word("defcont") {
            self.parse_defcont(&mut cursor, source);
        } else {
            tracing::trace!(
                line = %String::from_utf8_lossy(line).trim_end(),
                "directive ignored"
            );
        }
        true
    }

    fn parse_define(&mut self, cursor: &mut Cursor<'_>, source: &mut dyn LineSource) {
        let Some(name) = cursor.take_name() else {
            self.report(PreprocessError::Syntax);
            return;
        };
        let atom = self.pool.intern(&name);
        if self.macros.define(atom).is_none() {
            self.report(PreprocessError::MacroRedefined(name));
            return;
        }

        let params = match self.collect_formal_params(cursor) {
            Ok(params) => params,
            Err(err) => {
                self.report(err);
                return;
            }
        };
        let text = self.collect_macro_text(cursor, source);
        if let Some(defined) = self.macros.last_defined_mut() {
            for param in params {
                defined.add_param(param);
            }
            defined.append_line(&text);
        }
        tracing::debug!(name = %name, "macro defined");
    }

    fn parse_defcont(&mut self, cursor: &mut Cursor<'_>, source: &mut dyn LineSource) {
        if self.macros.last_defined_mut().is_none() {
            self.report(PreprocessError::DefcontWithoutDefine);
            return;
        }
        let text = self.collect_macro_text(cursor, source);
        if let Some(defined) = self.macros.last_defined_mut() {
            defined.append_line(&text);
        }
    }

    fn parse_undef(&mut self, cursor: &mut Cursor<'_>) {
        let Some(name) = cursor.take_name() else {
            self.report(PreprocessError::Syntax);
            return;
        };
        cursor.skip_blanks();
        if !cursor.at_end_of_statement() {
            self.report(PreprocessError::Syntax);
            return;
        }
        if let Some(atom) = self.pool.get(&name) {
            self.macros.undefine(&atom);
        }
    }

    /// `(a, b, ...)` directly after the macro name. A blank before the
    /// parenthesis makes it part of the body instead.
    fn collect_formal_params(&mut self, cursor: &mut Cursor<'_>) -> Result<Vec<Atom>, PreprocessError> {
        let mut params = Vec::new();
        if cursor.peek() != Some(b'(') {
            return Ok(params);
        }
        cursor.next();
        cursor.skip_blanks();
        if cursor.peek() == Some(b')') {
            cursor.next();
            return Ok(params);
        }

        loop {
            let name = cursor.take_name().ok_or(PreprocessError::Syntax)?;
            params.push(self.pool.intern(&name));
            cursor.skip_blanks();
            match cursor.next() {
                Some(b')') => return Ok(params),
                Some(b',') => {}
                _ => return Err(PreprocessError::Syntax),
            }
        }
    }

    /// Body text up to the comment or line end. A trailing backslash pulls
    /// in the next raw line, joined with a blank.
    fn collect_macro_text(&mut self, cursor: &mut Cursor<'_>, source: &mut dyn LineSource) -> Vec<u8> {
        cursor.skip_blanks();
        let mut line = cursor.rest().to_vec();
        cursor.skip_to_end();

        let mut text = Vec::new();
        loop {
            let mut scan = Cursor::from_bytes(&line);
            let mut continued = false;
            while !scan.at_end_of_statement() {
                if scan_quoted(&mut scan, &mut text).is_match() {
                    continue;
                }
                if scan.peek() == Some(b'\\') && scan.peek_at(1) == Some(b'\n') {
                    text.push(b' ');
                    continued = true;
                    break;
                }
                copy_byte(&mut scan, &mut text);
            }
            if !continued {
                break;
            }
            line = self.fetch_line(source).unwrap_or_default();
        }

        chomp(&mut text);
        text
    }
}
