// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Preprocessor core.
//!
//! Everything between the raw source files and the statements handed to the
//! assembler: nested input, `#define` macros and statement splitting.
//!
//! # Components
//!
//! - [`strpool`] - Interned names with identity comparison
//! - [`location`] - Source locations in C and assembly space
//! - [`error`] - Preprocessor errors and located diagnostics
//! - [`input`] - Stack of nested input files
//! - [`text_utils`] - Byte cursor and identifier helpers
//! - [`scanner`] - Number, string and paste classifiers
//! - [`macro_table`] - Scoped macro definitions
//! - [`preprocess`] - The preprocessor context and its line pump

mod directives;
mod expander;
mod statements;

pub mod error;
pub mod input;
pub mod location;
pub mod macro_table;
pub mod preprocess;
pub mod scanner;
pub mod strpool;
pub mod text_utils;

// Re-exports for convenience
pub use error::{Diagnostic, ErrorLog, PreprocessError};
pub use input::{search_path, InputStack, LineSource};
pub use location::{Location, LocationKind, Locations};
pub use macro_table::{Macro, MacroTable};
pub use preprocess::Preprocessor;
pub use strpool::{Atom, StrPool};
