// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Interned strings with identity comparison.
//!
//! Every distinct text is stored once per pool. An [`Atom`] is a handle to
//! that storage: two atoms from the same pool are equal exactly when their
//! text is equal, and the comparison is a pointer check.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

/// Handle to an interned string.
#[derive(Clone)]
pub struct Atom(Rc<str>);

impl Atom {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const u8 as usize).hash(state);
    }
}

impl Deref for Atom {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared string pool. Cloning yields another handle to the same pool.
#[derive(Clone, Default)]
pub struct StrPool {
    strings: Rc<RefCell<HashSet<Rc<str>>>>,
}

impl StrPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical handle for `text`, creating it on first use.
    pub fn intern(&self, text: &str) -> Atom {
        let mut strings = self.strings.borrow_mut();
        if let Some(existing) = strings.get(text) {
            return Atom(Rc::clone(existing));
        }
        let stored: Rc<str> = Rc::from(text);
        strings.insert(Rc::clone(&stored));
        Atom(stored)
    }

    pub fn intern_opt(&self, text: Option<&str>) -> Option<Atom> {
        text.map(|text| self.intern(text))
    }

    /// Look up `text` without adding it to the pool.
    pub fn get(&self, text: &str) -> Option<Atom> {
        self.strings
            .borrow()
            .get(text)
            .map(|existing| Atom(Rc::clone(existing)))
    }

    pub fn len(&self) -> usize {
        self.strings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.borrow().is_empty()
    }
}

impl fmt::Debug for StrPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrPool").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_text_yields_identical_handles() {
        let pool = StrPool::new();
        let a = pool.intern("hello");
        let b = pool.intern(&(String::from("hel") + "lo"));
        assert_eq!(a, b);
        assert!(Rc::ptr_eq(&a.0, &b.0));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn different_pools_do_not_compare_equal() {
        let a = StrPool::new().intern("x");
        let b = StrPool::new().intern("x");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn intern_none_is_none() {
        let pool = StrPool::new();
        assert!(pool.intern_opt(None).is_none());
        assert_eq!(pool.intern_opt(Some("f.asm")).unwrap().as_str(), "f.asm");
    }

    #[test]
    fn get_does_not_insert() {
        let pool = StrPool::new();
        assert!(pool.get("missing").is_none());
        assert!(pool.is_empty());
        let shared = pool.clone();
        let atom = shared.intern("seen");
        assert_eq!(pool.get("seen"), Some(atom));
    }
}
