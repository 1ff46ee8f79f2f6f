// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line front end.
//!
//! Pumps each input file through the preprocessor and stands in for the
//! assembler on the two statements that feed back into input handling:
//! `include "FILE"` and `c_line N[, "FILE"]`.

pub mod cli;

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use crate::core::error::{Diagnostic, PreprocessError};
use crate::core::input::{InputStack, LineSource};
use crate::core::location::{Location, LocationKind};
use crate::core::preprocess::Preprocessor;
use crate::core::strpool::StrPool;
use crate::core::text_utils::Cursor;

use cli::{validate_cli, Cli, DriverConfig, InputSpec};

pub use cli::VERSION;

const STDIN_NAME: &str = "<stdin>";

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("no input files specified")]
    NoInput,
    #[error("invalid -D/--define '{0}': expected NAME[=VAL]")]
    InvalidDefine(String),
    #[error("macro '{0}' defined more than once with -D/--define")]
    DuplicateDefine(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl DriverError {
    fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        DriverError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Outcome of a complete run.
#[derive(Debug, Default)]
pub struct RunReport {
    diagnostics: Vec<Diagnostic>,
    statements: usize,
}

impl RunReport {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn statements(&self) -> usize {
        self.statements
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Statements the driver acts on instead of writing them out.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Include(String),
    CLine(u32, Option<String>),
    /// A `c_line` whose line number is missing or out of range.
    BadCLine,
}

/// Install the stderr log subscriber: warnings only, debug with `verbose`.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .with_writer(io::stderr)
        .compact()
        .with_filter(filter);
    // A subscriber may already be installed when embedded.
    let _ = Registry::default().with(layer).try_init();
}

/// Run the preprocessor with command-line arguments.
pub fn run() -> Result<RunReport, DriverError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = validate_cli(&cli)?;
    run_with_config(&config)
}

pub fn run_with_config(config: &DriverConfig) -> Result<RunReport, DriverError> {
    run_with_stdin(config, &mut io::stdin().lock())
}

/// Like [`run_with_config`], reading `-` inputs from `stdin`.
pub fn run_with_stdin(config: &DriverConfig, stdin: &mut dyn Read) -> Result<RunReport, DriverError> {
    let mut out: Box<dyn Write> = match &config.outfile {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).map_err(|err| DriverError::io(path, err))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let out_name = config
        .outfile
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<stdout>".to_string());

    let pool = StrPool::new();
    let mut pp = Preprocessor::with_pool(pool.clone());
    if let Some(path) = &config.listing {
        let file = File::create(path).map_err(|err| DriverError::io(path, err))?;
        pp.set_listing(Box::new(BufWriter::new(file)));
    }

    let mut report = RunReport::default();
    for input in &config.inputs {
        let mut stack = InputStack::with_include_path(pool.clone(), config.include_path.clone());
        report.statements +=
            preprocess_input(&mut pp, &mut stack, config, input, stdin, &mut out, &out_name)?;
        report.diagnostics.extend(pp.errors_mut().take());
    }
    pp.reset();
    out.flush().map_err(|err| DriverError::io(&out_name, err))?;

    if let Some(path) = &config.error_file {
        write_error_file(path, &report.diagnostics)?;
    }
    tracing::debug!(
        statements = report.statements,
        errors = report.diagnostics.len(),
        "preprocessing finished"
    );
    Ok(report)
}

/// Preprocess one top-level source with a clean macro table.
fn preprocess_input(
    pp: &mut Preprocessor,
    stack: &mut InputStack,
    config: &DriverConfig,
    input: &InputSpec,
    stdin: &mut dyn Read,
    out: &mut dyn Write,
    out_name: &str,
) -> Result<usize, DriverError> {
    pp.reset();
    for (name, value) in &config.defines {
        if let Err(err) = pp.define(name, value) {
            pp.errors_mut().report(err, stack.locations());
        }
    }

    stack.push();
    let opened = match input {
        InputSpec::File(path) => stack.open(&path.to_string_lossy()),
        InputSpec::Stdin => {
            let mut text = Vec::new();
            stdin
                .read_to_end(&mut text)
                .map_err(|err| DriverError::io(STDIN_NAME, err))?;
            stack.open_text(STDIN_NAME, text)
        }
    };
    if let Err(err) = opened {
        pp.errors_mut().report(err, stack.locations());
        stack.pop();
        return Ok(0);
    }

    let mut statements = 0;
    loop {
        let Some(statement) = pp.macro_getline(stack) else {
            if stack.depth() > 1 {
                stack.pop();
                continue;
            }
            break;
        };
        match parse_command(&statement) {
            Some(Command::Include(filename)) => {
                stack.push();
                if let Err(err) = stack.open(&filename) {
                    pp.errors_mut().report(err, stack.locations());
                    stack.pop();
                }
            }
            Some(Command::CLine(line_num, filename)) => {
                let filename = pp
                    .pool()
                    .intern_opt(filename.as_deref())
                    .or_else(|| stack.location(LocationKind::C).filename.clone());
                stack.set_location(LocationKind::C, Location::new(filename, line_num));
            }
            Some(Command::BadCLine) => {
                pp.errors_mut().report(PreprocessError::Syntax, stack.locations());
            }
            None => {
                out.write_all(&statement)
                    .map_err(|err| DriverError::io(out_name, err))?;
                statements += 1;
            }
        }
    }
    stack.pop();
    Ok(statements)
}

fn parse_command(statement: &[u8]) -> Option<Command> {
    let mut cursor = Cursor::from_bytes(statement);
    cursor.skip_blanks();
    if cursor.eat_word("include") {
        cursor.skip_blanks();
        let filename = quoted_text(&mut cursor)?;
        return Some(Command::Include(filename));
    }
    if cursor.eat_word("c_line") {
        cursor.skip_blanks();
        let digits = cursor.rest().iter().take_while(|c| c.is_ascii_digit()).count();
        let parsed = std::str::from_utf8(&cursor.rest()[..digits])
            .ok()
            .and_then(|digits| digits.parse::<u32>().ok());
        let Some(line_num) = parsed else {
            return Some(Command::BadCLine);
        };
        cursor.advance(digits);
        cursor.skip_blanks();
        if cursor.peek() != Some(b',') {
            return Some(Command::CLine(line_num, None));
        }
        cursor.next();
        cursor.skip_blanks();
        return Some(Command::CLine(line_num, quoted_text(&mut cursor)));
    }
    None
}

fn quoted_text(cursor: &mut Cursor<'_>) -> Option<String> {
    let quote = match cursor.peek() {
        Some(q @ (b'"' | b'\'')) => q,
        _ => return None,
    };
    cursor.next();
    let start = cursor.pos();
    while cursor.peek().is_some_and(|c| c != quote && c != b'\n') {
        cursor.next();
    }
    if cursor.peek() != Some(quote) {
        return None;
    }
    let text = String::from_utf8_lossy(cursor.since(start)).into_owned();
    cursor.next();
    Some(text)
}

/// Append rendered diagnostics; an error file left empty is removed.
fn write_error_file(path: &Path, diagnostics: &[Diagnostic]) -> Result<(), DriverError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| DriverError::io(path, err))?;
    for diagnostic in diagnostics {
        writeln!(file, "{diagnostic}").map_err(|err| DriverError::io(path, err))?;
    }
    let len = file
        .metadata()
        .map_err(|err| DriverError::io(path, err))?
        .len();
    drop(file);
    if len == 0 {
        fs::remove_file(path).map_err(|err| DriverError::io(path, err))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests;
