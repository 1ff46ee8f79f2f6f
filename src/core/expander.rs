// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Macro call recognition, argument binding and body re-scanning.

use crate::core::error::PreprocessError;
use crate::core::preprocess::Preprocessor;
use crate::core::scanner::{copy_byte, scan_number, scan_paste, scan_quoted, Scan};
use crate::core::strpool::Atom;
use crate::core::text_utils::{chomp, is_ident_prefix, is_ident_start, Cursor};

impl Preprocessor {
    /// Identifier at the cursor: expanded when it names a macro, copied
    /// otherwise. A prefixed name (`#name`, `.name`, ...) only matches when
    /// it or its unprefixed part is a macro; in the latter case the prefix
    /// is kept in front of the expansion.
    pub(crate) fn scan_macro_call(&mut self, cursor: &mut Cursor<'_>, out: &mut Vec<u8>) -> Scan {
        let mut probe = *cursor;
        let prefixed = match (probe.peek(), probe.peek_at(1)) {
            (Some(prefix), Some(first)) if is_ident_prefix(prefix) && is_ident_start(first) => true,
            (Some(first), _) if is_ident_start(first) => false,
            _ => return Scan::Unmatched,
        };
        let Some(name) = probe.take_name() else {
            return Scan::Unmatched;
        };

        if let Some(found) = self.find_macro(&name) {
            self.expand_macro(&found, &mut probe, out);
        } else if !prefixed {
            out.extend_from_slice(name.as_bytes());
        } else if let Some(found) = self.find_macro(&name[1..]) {
            out.push(name.as_bytes()[0]);
            self.expand_macro(&found, &mut probe, out);
        } else {
            return Scan::Unmatched;
        }
        *cursor = probe;
        Scan::Matched
    }

    /// `#token`: the spelling of the following call or number, quoted.
    pub(crate) fn scan_stringize(&mut self, cursor: &mut Cursor<'_>, out: &mut Vec<u8>) -> Scan {
        if cursor.peek() != Some(b'#') {
            return Scan::Unmatched;
        }
        let mut probe = *cursor;
        probe.next();
        probe.skip_blanks();

        let mut text = Vec::new();
        if self.scan_macro_call(&mut probe, &mut text).is_match() {
            out.push(b'"');
            for &c in &text {
                if c == b'"' {
                    out.extend_from_slice(b"\\\"");
                } else {
                    out.push(c);
                }
            }
            out.push(b'"');
        } else if scan_number(&mut probe, &mut text).is_match() {
            out.push(b'"');
            out.extend_from_slice(&text);
            out.push(b'"');
        } else {
            return Scan::Unmatched;
        }
        *cursor = probe;
        Scan::Matched
    }

    /// Expand `name`, taking its arguments from `cursor`.
    pub(crate) fn expand_macro(&mut self, name: &Atom, cursor: &mut Cursor<'_>, out: &mut Vec<u8>) {
        let Some(found) = self.macros.lookup_mut(name) else {
            return;
        };
        if found.is_expanding() {
            self.report(PreprocessError::MacroRecursion(name.to_string()));
            return;
        }
        found.set_expanding(true);
        let params = found.params().to_vec();
        let body = found.text().to_vec();
        tracing::trace!(name = %name, "expanding macro");

        self.macros.push_scope();
        let bound = if params.is_empty() {
            Ok(())
        } else {
            self.collect_arguments(&params, cursor)
        };
        match bound {
            Ok(()) => self.rescan(&body, out),
            Err(err) => self.report(err),
        }
        self.macros.pop_scope();

        if let Some(found) = self.macros.lookup_mut(name) {
            found.set_expanding(false);
        }
    }

    /// Run a macro body back through the classifiers.
    fn rescan(&mut self, body: &[u8], out: &mut Vec<u8>) {
        let mut cursor = Cursor::from_bytes(body);
        while !cursor.is_at_end() {
            let matched = self
                .scan_macro_call(&mut cursor, out)
                .or_else(|| scan_number(&mut cursor, out))
                .or_else(|| scan_quoted(&mut cursor, out))
                .or_else(|| scan_paste(&mut cursor, out))
                .or_else(|| self.scan_stringize(&mut cursor, out));
            if !matched.is_match() {
                copy_byte(&mut cursor, out);
            }
        }
    }

    /// Bind one argument per parameter in the current (fresh) scope.
    ///
    /// Arguments are either wrapped in parentheses or run to the end of the
    /// statement. An error return means the expansion must be dropped;
    /// surplus or unclosed argument lists are reported here and the
    /// expansion goes ahead with what was bound.
    fn collect_arguments(&mut self, params: &[Atom], cursor: &mut Cursor<'_>) -> Result<(), PreprocessError> {
        cursor.skip_blanks();
        let in_parens = cursor.peek() == Some(b'(');
        if in_parens {
            cursor.next();
            cursor.skip_blanks();
        }

        let mut text = Vec::new();
        for (index, param) in params.iter().enumerate() {
            cursor.skip_blanks();
            text.clear();
            let empty = match cursor.peek() {
                Some(b',') => true,
                Some(b')') if in_parens => true,
                _ => !in_parens && cursor.at_end_of_statement(),
            };
            if !empty {
                self.collect_argument(cursor, &mut text)?;
                chomp(&mut text);
            }
            self.macros.bind(param.clone(), &text);

            cursor.skip_blanks();
            if index + 1 < params.len() {
                if cursor.peek() != Some(b',') {
                    return Err(PreprocessError::MissingMacroArguments);
                }
                cursor.next();
            }
        }

        cursor.skip_blanks();
        if in_parens {
            match cursor.peek() {
                Some(b')') => {
                    cursor.next();
                }
                Some(b',') => {
                    self.report(PreprocessError::ExtraMacroArguments);
                    skip_surplus_arguments(cursor);
                }
                _ => self.report(PreprocessError::MissingCloseParen),
            }
        } else if !cursor.at_end_of_statement() {
            self.report(PreprocessError::ExtraMacroArguments);
        }
        Ok(())
    }

    /// One argument: `<verbatim text>` or a token run up to a `,` or `)`
    /// outside nested parentheses.
    fn collect_argument(&mut self, cursor: &mut Cursor<'_>, text: &mut Vec<u8>) -> Result<(), PreprocessError> {
        cursor.skip_blanks();
        if cursor.peek() == Some(b'<') {
            cursor.next();
            return collect_angle_argument(cursor, text);
        }

        let mut open_parens = 0usize;
        while !cursor.at_end_of_statement() {
            let matched = scan_number(cursor, text)
                .or_else(|| self.scan_macro_call(cursor, text))
                .or_else(|| scan_quoted(cursor, text))
                .or_else(|| scan_paste(cursor, text))
                .or_else(|| self.scan_stringize(cursor, text));
            if matched.is_match() {
                continue;
            }
            match cursor.peek() {
                Some(b'(') => open_parens += 1,
                Some(b')' | b',') if open_parens == 0 => return Ok(()),
                Some(b')') => open_parens -= 1,
                _ => {}
            }
            copy_byte(cursor, text);
        }

        if open_parens != 0 {
            return Err(PreprocessError::MissingCloseParen);
        }
        Ok(())
    }
}

/// Copy up to the first `>` not preceded by a backslash.
fn collect_angle_argument(cursor: &mut Cursor<'_>, text: &mut Vec<u8>) -> Result<(), PreprocessError> {
    loop {
        match cursor.peek() {
            None | Some(b'\n') => return Err(PreprocessError::MissingCloseAngleBracket),
            Some(b'>') => {
                cursor.next();
                return Ok(());
            }
            Some(b'\\') if cursor.peek_at(1).is_some_and(|c| c != b'\n') => {
                copy_byte(cursor, text);
                copy_byte(cursor, text);
            }
            Some(_) => copy_byte(cursor, text),
        }
    }
}

/// Drop a surplus `, ...)` tail of a parenthesized call.
fn skip_surplus_arguments(cursor: &mut Cursor<'_>) {
    let mut open_parens = 0usize;
    let mut discarded = Vec::new();
    while !cursor.at_end_of_statement() {
        if scan_quoted(cursor, &mut discarded).is_match() {
            continue;
        }
        match cursor.next() {
            Some(b'(') => open_parens += 1,
            Some(b')') if open_parens == 0 => return,
            Some(b')') => open_parens -= 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::input::InputStack;
    use crate::core::preprocess::Preprocessor;

    fn expand(defs: &str, line: &str) -> (Vec<String>, Vec<&'static str>) {
        let mut pp = Preprocessor::new();
        let mut input = InputStack::new(pp.pool().clone());
        input.push();
        input.open_text("expand.asm", format!("{defs}{line}")).unwrap();
        let mut out = Vec::new();
        while let Some(statement) = pp.macro_getline(&mut input) {
            out.push(String::from_utf8(statement).unwrap());
        }
        let codes = pp.errors().diagnostics().iter().map(|d| d.code()).collect();
        (out, codes)
    }

    #[test]
    fn arguments_without_parentheses_run_to_end_of_statement() {
        let (out, codes) = expand("#define PAIR(a, b) defb b, a\n", "PAIR 1, 2 ; swap\n");
        assert_eq!(out, vec!["defb 2, 1\n"]);
        assert!(codes.is_empty());
    }

    #[test]
    fn empty_arguments_bind_empty_text() {
        let (out, _) = expand("#define T(a, b, c) [a|b|c]\n", "T(, x ,)\n");
        assert_eq!(out, vec!["[|x|]\n"]);
    }

    #[test]
    fn angle_argument_is_verbatim() {
        let (out, codes) = expand("#define Q(p) p\n", "Q <x, y>\n");
        assert_eq!(out, vec!["x, y\n"]);
        assert!(codes.is_empty());

        let (out, codes) = expand("#define Q(p) p\n", "Q(<a\\>b>)\n");
        assert_eq!(out, vec!["a\\>b\n"]);
        assert!(codes.is_empty());
    }

    #[test]
    fn unterminated_angle_argument_drops_expansion() {
        let (out, codes) = expand("#define Q(p) [p]\n", "Q <x, y\n");
        assert_eq!(out, vec!["\n"]);
        assert_eq!(codes, vec!["missing-close-angle-bracket"]);
    }

    #[test]
    fn missing_arguments() {
        let (out, codes) = expand("#define TWO(a, b) a+b\n", "TWO(1)\n");
        assert_eq!(out, vec![")\n"]);
        assert_eq!(codes, vec!["missing-macro-arguments"]);
    }

    #[test]
    fn extra_arguments_still_expand() {
        let (out, codes) = expand("#define ONE(a) <a>\n", "ONE 1, 2\n");
        assert_eq!(out, vec!["<1>, 2\n"]);
        assert_eq!(codes, vec!["extra-macro-arguments"]);

        let (out, codes) = expand("#define ONE(a) <a>\n", "ONE(1, f(2)) + 3\n");
        assert_eq!(out, vec!["<1> + 3\n"]);
        assert_eq!(codes, vec!["extra-macro-arguments"]);
    }

    #[test]
    fn stray_close_paren_without_parentheses_is_extra() {
        let (out, codes) = expand("#define ONE(a) <a>\n", "ONE 1)\n");
        assert_eq!(out, vec!["<1>)\n"]);
        assert_eq!(codes, vec!["extra-macro-arguments"]);
    }

    #[test]
    fn argument_bytes_are_bound_verbatim() {
        let mut pp = Preprocessor::new();
        let mut input = InputStack::new(pp.pool().clone());
        input.push();
        input
            .open_text("bytes.asm", b"#define MSG(s) defm s\nMSG(\"\xE9t\xE9\")\n".to_vec())
            .unwrap();
        assert_eq!(
            pp.macro_getline(&mut input),
            Some(b"defm \"\xE9t\xE9\"\n".to_vec())
        );
        assert!(pp.errors().is_empty());
    }

    #[test]
    fn unbalanced_parentheses_in_argument() {
        let (out, codes) = expand("#define ONE(a) <a>\n", "ONE (1\n");
        assert_eq!(out, vec!["<1>\n"]);
        assert_eq!(codes, vec!["missing-close-paren"]);

        let (out, codes) = expand("#define ONE(a) <a>\n", "ONE x(1\n");
        assert_eq!(out, vec!["\n"]);
        assert_eq!(codes, vec!["missing-close-paren"]);
    }

    #[test]
    fn nested_calls_expand_inside_bodies() {
        let (out, codes) = expand(
            "#define INC(r) inc r\n#define TWICE(r) INC(r)\n#defcont INC(r)\n",
            "TWICE(hl)\n",
        );
        assert_eq!(out, vec!["inc hl\n", "inc hl\n"]);
        assert!(codes.is_empty());
    }

    #[test]
    fn stringize_quotes_call_and_number_spellings() {
        let (out, _) = expand("#define S(x) # x\n", "defm S(hello)\n");
        assert_eq!(out, vec!["defm \"hello\"\n"]);

        let (out, _) = expand("#define QUOTE \"hi\"\n#define S(x) # x\n", "defm S(QUOTE)\n");
        assert_eq!(out, vec!["defm \"\\\"hi\\\"\"\n"]);

        let (out, _) = expand("", "defm #$FF, #0x1F, # 42, #xyz\n");
        assert_eq!(out, vec!["defm \"$FF\", \"0x1F\", \"42\", \"xyz\"\n"]);
    }

    #[test]
    fn prefixed_name_expands_unprefixed_macro() {
        let (out, _) = expand("#define imm 5\n#define .lbl here\n", "ld a, #imm\n.lbl\n$other\n");
        assert_eq!(out, vec!["ld a, #5\n", "here\n", "$other\n"]);
    }

    #[test]
    fn paste_joins_neighbours() {
        let (out, _) = expand("#define CAT(a, b) a ## b\n", "CAT(ld, ir)\n");
        assert_eq!(out, vec!["ldir\n"]);
    }

    #[test]
    fn macro_used_in_its_own_arguments_is_recursion() {
        let (out, codes) = expand("#define M(x) (x)\n", "M(M(1))\n");
        assert_eq!(out, vec!["((1))\n"]);
        assert_eq!(codes, vec!["macro-recursion"]);
    }
}
