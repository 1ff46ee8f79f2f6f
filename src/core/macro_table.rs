// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Scoped table of `#define` macros.
//!
//! The bottom scope holds user definitions. Each expansion pushes a scope
//! for its parameter bindings and pops it when done, so a parameter is only
//! visible while its expansion runs. Lookup walks from the innermost scope
//! outwards.

use std::collections::HashMap;

use crate::core::strpool::Atom;

#[derive(Debug, Clone, Default)]
pub struct Macro {
    params: Vec<Atom>,
    text: Vec<u8>,
    expanding: bool,
}

impl Macro {
    pub fn params(&self) -> &[Atom] {
        &self.params
    }

    /// Raw body bytes; `#defcont` lines are joined with `\n`.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn is_expanding(&self) -> bool {
        self.expanding
    }

    pub fn add_param(&mut self, param: Atom) {
        self.params.push(param);
    }

    pub fn set_text(&mut self, text: impl Into<Vec<u8>>) {
        self.text = text.into();
    }

    /// Append one more body line, newline separated from what is there.
    pub fn append_line(&mut self, line: &[u8]) {
        if !self.text.is_empty() {
            self.text.push(b'\n');
        }
        self.text.extend_from_slice(line);
    }

    pub(crate) fn set_expanding(&mut self, expanding: bool) {
        self.expanding = expanding;
    }
}

/// Position of the most recent `#define`, target of `#defcont`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LastDefined {
    scope: usize,
    name: Atom,
}

#[derive(Debug)]
pub struct MacroTable {
    scopes: Vec<HashMap<Atom, Macro>>,
    last_defined: Option<LastDefined>,
}

impl Default for MacroTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            last_defined: None,
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Drop the innermost scope and every macro in it. The bottom scope is
    /// never removed, only emptied.
    pub fn pop_scope(&mut self) {
        let innermost = self.scopes.len() - 1;
        if self
            .last_defined
            .as_ref()
            .is_some_and(|last| last.scope == innermost)
        {
            self.last_defined = None;
        }
        if innermost == 0 {
            self.scopes[0].clear();
        } else {
            self.scopes.pop();
        }
    }

    /// Remove every scope above the bottom one and empty it.
    pub fn clear(&mut self) {
        self.scopes.truncate(1);
        self.scopes[0].clear();
        self.last_defined = None;
    }

    /// Create `name` in the innermost scope and make it the `#defcont`
    /// target. Returns `None` when the innermost scope already has it;
    /// outer definitions may be shadowed.
    pub fn define(&mut self, name: Atom) -> Option<&mut Macro> {
        let scope = self.scopes.len() - 1;
        if self.scopes[scope].contains_key(&name) {
            return None;
        }
        self.last_defined = Some(LastDefined {
            scope,
            name: name.clone(),
        });
        Some(self.insert(scope, name))
    }

    /// Bind an expansion parameter in the innermost scope. Bindings never
    /// become the `#defcont` target. An earlier binding of the same name in
    /// this scope is kept.
    pub fn bind(&mut self, name: Atom, text: &[u8]) {
        let scope = self.scopes.len() - 1;
        if !self.scopes[scope].contains_key(&name) {
            self.insert(scope, name).set_text(text);
        }
    }

    /// Remove `name` from the innermost scope. Absent names are ignored.
    pub fn undefine(&mut self, name: &Atom) {
        let scope = self.scopes.len() - 1;
        if self.scopes[scope].remove(name).is_some() {
            tracing::debug!(name = %name, "macro undefined");
            if self
                .last_defined
                .as_ref()
                .is_some_and(|last| last.scope == scope && &last.name == name)
            {
                self.last_defined = None;
            }
        }
    }

    pub fn lookup(&self, name: &Atom) -> Option<&Macro> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_mut(&mut self, name: &Atom) -> Option<&mut Macro> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    pub fn last_defined_mut(&mut self) -> Option<&mut Macro> {
        let last = self.last_defined.as_ref()?;
        self.scopes.get_mut(last.scope)?.get_mut(&last.name)
    }

    fn insert(&mut self, scope: usize, name: Atom) -> &mut Macro {
        self.scopes[scope]
            .entry(name)
            .or_default()
    }
}
