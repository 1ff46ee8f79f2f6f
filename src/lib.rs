// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Library entry exposing the preprocessor core and its command-line driver.

pub mod core;
pub mod driver;

pub use crate::core::{
    Atom, Diagnostic, ErrorLog, InputStack, LineSource, Location, LocationKind, Locations,
    PreprocessError, Preprocessor, StrPool,
};
