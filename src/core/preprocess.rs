// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Preprocessor context: #define/#undef/#defcont, macro expansion and
// statement splitting between the raw source and the assembler.

use std::collections::VecDeque;
use std::io::Write;

use crate::core::error::{ErrorLog, PreprocessError};
use crate::core::input::LineSource;
use crate::core::location::{LocationKind, Locations};
use crate::core::macro_table::{Macro, MacroTable};
use crate::core::strpool::{Atom, StrPool};

/// All state of one preprocessing run.
///
/// Raw lines are pulled from a [`LineSource`] one at a time; each one is
/// either a directive or is macro-expanded and split into statements, which
/// queue up until the assembler asks for them.
pub struct Preprocessor {
    pub(crate) pool: StrPool,
    pub(crate) macros: MacroTable,
    pub(crate) out_lines: VecDeque<Vec<u8>>,
    pub(crate) in_defgroup: bool,
    pub(crate) locations: Locations,
    errors: ErrorLog,
    listing: Option<Box<dyn Write>>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::with_pool(StrPool::new())
    }

    /// Share `pool` with the input stack so filenames and macro names are
    /// interned once.
    pub fn with_pool(pool: StrPool) -> Self {
        Self {
            pool,
            macros: MacroTable::new(),
            out_lines: VecDeque::new(),
            in_defgroup: false,
            locations: Locations::new(),
            errors: ErrorLog::new(),
            listing: None,
        }
    }

    pub fn pool(&self) -> &StrPool {
        &self.pool
    }

    /// Predefine a parameterless macro.
    pub fn define(&mut self, name: &str, value: &str) -> Result<(), PreprocessError> {
        let atom = self.pool.intern(name);
        let defined = self
            .macros
            .define(atom)
            .ok_or_else(|| PreprocessError::MacroRedefined(name.to_string()))?;
        defined.set_text(value);
        tracing::debug!(name, value, "macro predefined");
        Ok(())
    }

    pub fn undefine(&mut self, name: &str) {
        if let Some(atom) = self.pool.get(name) {
            self.macros.undefine(&atom);
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<&Macro> {
        let atom = self.pool.get(name)?;
        self.macros.lookup(&atom)
    }

    /// Receive an annotated copy of every raw line read and every statement
    /// returned.
    pub fn set_listing(&mut self, writer: Box<dyn Write>) {
        self.listing = Some(writer);
    }

    /// Forget all macros and pending lines before the next module.
    pub fn reset(&mut self) {
        self.macros.clear();
        self.out_lines.clear();
        self.in_defgroup = false;
        self.locations.clear();
        if let Some(listing) = self.listing.as_mut() {
            if let Err(err) = listing.flush() {
                tracing::warn!("preprocessor listing flush failed: {err}");
            }
        }
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorLog {
        &mut self.errors
    }

    /// Next fully preprocessed statement, or `None` once `source` is
    /// exhausted. Statements are raw bytes, newline terminated.
    pub fn macro_getline(&mut self, source: &mut dyn LineSource) -> Option<Vec<u8>> {
        let line = loop {
            if let Some(line) = self.out_lines.pop_front() {
                break Some(line);
            }
            let Some(raw) = self.fetch_line(source) else {
                break None;
            };
            self.parse_line(&raw, source);
        };

        if let Some(line) = &line {
            let header = listing_header(source.locations());
            let mut entry = format!("\t{header}\n\t").into_bytes();
            entry.extend_from_slice(line);
            self.write_listing(&entry);
        }
        line
    }

    /// Pull one raw line, keeping the location snapshot used for
    /// diagnostics current.
    pub(crate) fn fetch_line(&mut self, source: &mut dyn LineSource) -> Option<Vec<u8>> {
        let result = source.next_line();
        self.locations = source.locations().clone();
        match result {
            Ok(Some(line)) => {
                let header = listing_header(&self.locations);
                let mut entry = format!(";\t{header}\n;\t").into_bytes();
                entry.extend_from_slice(&line);
                self.write_listing(&entry);
                Some(line)
            }
            Ok(None) => None,
            Err(err) => {
                self.report(err);
                None
            }
        }
    }

    fn parse_line(&mut self, line: &[u8], source: &mut dyn LineSource) {
        if !self.parse_directive(line, source) {
            self.expand_statements(line);
        }
    }

    pub(crate) fn report(&mut self, error: PreprocessError) {
        self.errors.report(error, &self.locations);
    }

    pub(crate) fn find_macro(&self, name: &str) -> Option<Atom> {
        let atom = self.pool.get(name)?;
        self.macros.lookup(&atom).map(|_| atom)
    }

    pub(crate) fn queue_statement(&mut self, statement: Vec<u8>) {
        tracing::trace!(
            statement = %String::from_utf8_lossy(&statement).trim_end(),
            "statement queued"
        );
        self.out_lines.push_back(statement);
    }

    fn write_listing(&mut self, entry: &[u8]) {
        let Some(listing) = self.listing.as_mut() else {
            return;
        };
        if let Err(err) = listing.write_all(entry) {
            tracing::warn!("preprocessor listing disabled: {err}");
            self.listing = None;
        }
    }
}

fn listing_header(locations: &Locations) -> String {
    let asm = locations.get(LocationKind::Asm);
    let filename = asm.filename.as_ref().map(|name| name.as_str()).unwrap_or("");
    format!("LINE {}, \"{}\"", asm.line_num, filename)
}
