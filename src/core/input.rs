// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Stack of nested input sources.
//!
//! Each scope reads one file (or one in-memory text) line by line. Line
//! terminators `\r`, `\r\n` and `\n` all come back as a single `\n`. The
//! assembly-space location follows the scope on top of the stack; the
//! C-space location is only ever changed explicitly.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::iter::Peekable;
use std::path::{Path, PathBuf};

use crate::core::error::PreprocessError;
use crate::core::location::{Location, LocationKind, Locations};
use crate::core::strpool::{Atom, StrPool};

type ByteStream = Peekable<io::Bytes<Box<dyn BufRead>>>;

/// Something the preprocessor can pull raw lines from.
pub trait LineSource {
    /// Next raw line including its `\n`, or `None` once exhausted. Bytes
    /// other than line terminators are passed through untouched.
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, PreprocessError>;

    /// Current location in every coordinate space.
    fn locations(&self) -> &Locations;
}

struct InputScope {
    reader: Option<ByteStream>,
    location: Location,
    eof: bool,
}

impl InputScope {
    fn new() -> Self {
        Self {
            reader: None,
            location: Location::default(),
            eof: false,
        }
    }
}

pub struct InputStack {
    scopes: Vec<InputScope>,
    locations: Locations,
    include_path: Vec<PathBuf>,
    pool: StrPool,
}

impl InputStack {
    pub fn new(pool: StrPool) -> Self {
        Self::with_include_path(pool, Vec::new())
    }

    pub fn with_include_path(pool: StrPool, include_path: Vec<PathBuf>) -> Self {
        Self {
            scopes: Vec::new(),
            locations: Locations::new(),
            include_path,
            pool,
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// True when the top scope has already returned its end of input.
    pub fn is_eof(&self) -> bool {
        self.scopes.last().is_some_and(|scope| scope.eof)
    }

    pub fn push(&mut self) {
        self.scopes.push(InputScope::new());
    }

    /// Close and drop the top scope. Dropping the last one forgets every
    /// location.
    pub fn pop(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            if let Some(filename) = &scope.location.filename {
                tracing::trace!(file = %filename, "input scope closed");
            }
        }
        match self.scopes.last() {
            Some(top) => self.locations.set(LocationKind::Asm, top.location.clone()),
            None => self.locations.clear(),
        }
    }

    /// Open `filename` in the top scope, searching the include path.
    pub fn open(&mut self, filename: &str) -> Result<(), PreprocessError> {
        if self.scopes.is_empty() {
            return Err(PreprocessError::CannotOpen(filename.to_string()));
        }
        self.close_top();

        let found = search_path(filename, &self.include_path);
        let found = self.pool.intern(&found.to_string_lossy());
        if self.in_stack(&found) {
            return Err(PreprocessError::IncludeRecursion(filename.to_string()));
        }
        let file = File::open(found.as_str())
            .map_err(|_| PreprocessError::CannotOpen(filename.to_string()))?;
        tracing::debug!(file = %found, "input file opened");
        self.bind(found, Box::new(BufReader::new(file)));
        Ok(())
    }

    /// Bind the top scope to in-memory `text`, reported under `name`.
    pub fn open_text(&mut self, name: &str, text: impl Into<Vec<u8>>) -> Result<(), PreprocessError> {
        if self.scopes.is_empty() {
            return Err(PreprocessError::CannotOpen(name.to_string()));
        }
        self.close_top();

        let name_atom = self.pool.intern(name);
        if self.in_stack(&name_atom) {
            return Err(PreprocessError::IncludeRecursion(name.to_string()));
        }
        self.bind(name_atom, Box::new(io::Cursor::new(text.into())));
        Ok(())
    }

    /// Read the next line of the top scope.
    ///
    /// The line number advances on every call that finds the input open,
    /// including the one that first reaches end of input; later calls
    /// return `None` and leave it alone.
    pub fn getline(&mut self) -> Result<Option<Vec<u8>>, PreprocessError> {
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(None);
        };
        let Some(reader) = scope.reader.as_mut() else {
            return Ok(None);
        };

        let mut line = Vec::new();
        let mut failed = false;
        loop {
            match reader.next() {
                None => break,
                Some(Err(_)) => {
                    failed = true;
                    break;
                }
                Some(Ok(b'\r')) => {
                    if let Some(Ok(b'\n')) = reader.peek() {
                        reader.next();
                    }
                    line.push(b'\n');
                    break;
                }
                Some(Ok(b'\n')) => {
                    line.push(b'\n');
                    break;
                }
                Some(Ok(byte)) => line.push(byte),
            }
        }
        if !line.is_empty() && line.last() != Some(&b'\n') {
            line.push(b'\n');
        }

        scope.location.line_num += 1;
        self.locations.set(LocationKind::Asm, scope.location.clone());

        if failed || line.is_empty() {
            scope.reader = None;
            scope.eof = true;
            let name = scope
                .location
                .filename
                .as_ref()
                .map(|name| name.to_string())
                .unwrap_or_default();
            if failed {
                return Err(PreprocessError::CannotRead(name));
            }
            tracing::trace!(file = %name, "end of input");
            return Ok(None);
        }
        Ok(Some(line))
    }

    pub fn location(&self, kind: LocationKind) -> &Location {
        self.locations.get(kind)
    }

    /// Override a location. Overriding the assembly space also moves the
    /// top scope, so later lines count on from the new value.
    pub fn set_location(&mut self, kind: LocationKind, location: Location) {
        if kind == LocationKind::Asm {
            if let Some(top) = self.scopes.last_mut() {
                top.location = location.clone();
            }
        }
        self.locations.set(kind, location);
    }

    fn close_top(&mut self) {
        if let Some(top) = self.scopes.last_mut() {
            top.reader = None;
        }
    }

    fn in_stack(&self, filename: &Atom) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.location.filename.as_ref() == Some(filename))
    }

    fn bind(&mut self, filename: Atom, reader: Box<dyn BufRead>) {
        let location = Location::new(Some(filename), 0);
        if let Some(top) = self.scopes.last_mut() {
            top.reader = Some(reader.bytes().peekable());
            top.location = location.clone();
            top.eof = false;
        }
        self.locations.set(LocationKind::Asm, location);
    }
}

impl LineSource for InputStack {
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, PreprocessError> {
        self.getline()
    }

    fn locations(&self) -> &Locations {
        &self.locations
    }
}

/// Resolve `filename` against the include path. A name that exists as
/// given wins; otherwise the first directory containing it; otherwise the
/// name itself, which will then fail to open.
pub fn search_path(filename: &str, dirs: &[PathBuf]) -> PathBuf {
    let direct = Path::new(filename);
    if direct.is_file() {
        return direct.to_path_buf();
    }
    dirs.iter()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| direct.to_path_buf())
}
