// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Preprocessor error kinds, diagnostics and the error log.

use std::fmt;

use crate::core::location::Locations;

/// Every error the preprocessor and input stack can raise. None of them is
/// fatal: the caller records it and moves on to the next statement or line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreprocessError {
    #[error("recursion expanding macro '{0}'")]
    MacroRecursion(String),
    #[error("missing macro arguments")]
    MissingMacroArguments,
    #[error("extra macro arguments")]
    ExtraMacroArguments,
    #[error("missing close angle bracket")]
    MissingCloseAngleBracket,
    #[error("missing close parenthesis")]
    MissingCloseParen,
    #[error("macro '{0}' redefined")]
    MacroRedefined(String),
    #[error("#defcont without #define")]
    DefcontWithoutDefine,
    #[error("syntax error")]
    Syntax,
    #[error("cannot include '{0}' recursively")]
    IncludeRecursion(String),
    #[error("cannot open '{0}'")]
    CannotOpen(String),
    #[error("cannot read '{0}'")]
    CannotRead(String),
}

impl PreprocessError {
    /// Stable tag identifying the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            PreprocessError::MacroRecursion(_) => "macro-recursion",
            PreprocessError::MissingMacroArguments => "missing-macro-arguments",
            PreprocessError::ExtraMacroArguments => "extra-macro-arguments",
            PreprocessError::MissingCloseAngleBracket => "missing-close-angle-bracket",
            PreprocessError::MissingCloseParen => "missing-close-paren",
            PreprocessError::MacroRedefined(_) => "macro-redefined",
            PreprocessError::DefcontWithoutDefine => "defcont-without-define",
            PreprocessError::Syntax => "syntax",
            PreprocessError::IncludeRecursion(_) => "include-recursion",
            PreprocessError::CannotOpen(_) => "cannot-open",
            PreprocessError::CannotRead(_) => "cannot-read",
        }
    }
}

/// An error together with where it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    error: PreprocessError,
    locations: Locations,
}

impl Diagnostic {
    pub fn new(error: PreprocessError, locations: Locations) -> Self {
        Self { error, locations }
    }

    pub fn error(&self) -> &PreprocessError {
        &self.error
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error{}: {}", self.locations, self.error)
    }
}

/// Ordered record of every diagnostic reported during a run.
#[derive(Debug, Default)]
pub struct ErrorLog {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: PreprocessError, locations: &Locations) {
        let diagnostic = Diagnostic::new(error, locations.clone());
        tracing::debug!(code = diagnostic.code(), "{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Hand over everything reported so far, leaving the log empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
