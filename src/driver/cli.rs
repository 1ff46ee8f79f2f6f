// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::core::text_utils::Cursor;
use crate::driver::DriverError;

pub const VERSION: &str = "1.0";

const LONG_ABOUT: &str = "Z80 assembler source preprocessor.

Reads each FILE in turn, applies #define/#defcont/#undef macros, splits
multi-statement lines and rewrites EQU/= assignments to defc. The resulting
statements go to stdout or to -o/--outfile.
`include \"FILE\"` statements are followed through the include path given
with -I/--include-path. Use - as FILE to read standard input.
Each FILE starts with an empty macro table apart from -D/--define macros.";

#[derive(Parser, Debug)]
#[command(
    name = "z80pp",
    version = VERSION,
    about = "Z80 assembler source preprocessor",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 'I',
        long = "include-path",
        value_name = "DIR",
        action = ArgAction::Append,
        long_help = "Directory searched for include files (repeatable). A name that exists as given is used first."
    )]
    pub include_path: Vec<PathBuf>,
    #[arg(
        short = 'D',
        long = "define",
        value_name = "NAME[=VAL]",
        action = ArgAction::Append,
        long_help = "Predefine a macro (repeatable). If VAL is omitted, defaults to 1."
    )]
    pub defines: Vec<String>,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "FILE",
        long_help = "Write the preprocessed statements to FILE instead of stdout."
    )]
    pub outfile: Option<PathBuf>,
    #[arg(
        short = 'i',
        long = "listing",
        value_name = "FILE",
        long_help = "Write an annotated listing of every raw line read and every statement produced."
    )]
    pub listing: Option<PathBuf>,
    #[arg(
        short = 'e',
        long = "error-file",
        value_name = "FILE",
        long_help = "Append diagnostics to FILE. The file is removed again when it stays empty."
    )]
    pub error_file: Option<PathBuf>,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::SetTrue,
        long_help = "Log preprocessor activity to stderr."
    )]
    pub verbose: bool,
    #[arg(value_name = "FILE", long_help = "Source files to preprocess; - reads stdin.")]
    pub infiles: Vec<String>,
}

/// Where one top-level source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSpec {
    Stdin,
    File(PathBuf),
}

/// Validated command-line settings.
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    pub inputs: Vec<InputSpec>,
    pub include_path: Vec<PathBuf>,
    pub defines: Vec<(String, String)>,
    pub outfile: Option<PathBuf>,
    pub listing: Option<PathBuf>,
    pub error_file: Option<PathBuf>,
    pub verbose: bool,
}

/// Split `NAME[=VAL]`; the value defaults to `1`.
pub fn parse_define(arg: &str) -> Result<(String, String), DriverError> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => (name, value),
        None => (arg, "1"),
    };
    if !is_macro_name(name) {
        return Err(DriverError::InvalidDefine(arg.to_string()));
    }
    Ok((name.to_string(), value.to_string()))
}

fn is_macro_name(name: &str) -> bool {
    let mut cursor = Cursor::new(name);
    cursor.take_name().as_deref() == Some(name) && cursor.is_at_end()
}

/// Validate CLI arguments and return parsed configuration.
pub fn validate_cli(cli: &Cli) -> Result<DriverConfig, DriverError> {
    if cli.infiles.is_empty() {
        return Err(DriverError::NoInput);
    }

    let mut seen = HashSet::new();
    let mut defines = Vec::with_capacity(cli.defines.len());
    for arg in &cli.defines {
        let (name, value) = parse_define(arg)?;
        if !seen.insert(name.clone()) {
            return Err(DriverError::DuplicateDefine(name));
        }
        defines.push((name, value));
    }

    let inputs = cli
        .infiles
        .iter()
        .map(|name| match name.as_str() {
            "-" => InputSpec::Stdin,
            _ => InputSpec::File(PathBuf::from(name)),
        })
        .collect();

    Ok(DriverConfig {
        inputs,
        include_path: cli.include_path.clone(),
        defines,
        outfile: cli.outfile.clone(),
        listing: cli.listing.clone(),
        error_file: cli.error_file.clone(),
        verbose: cli.verbose,
    })
}
