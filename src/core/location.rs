// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Source locations in the two coordinate spaces used by diagnostics.

use std::fmt;

use crate::core::strpool::Atom;

/// Coordinate space of a location.
///
/// `C` tracks the higher-level source that generated the assembly (set by
/// line directives embedded in compiler output), `Asm` tracks the assembly
/// file being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    C,
    Asm,
}

impl LocationKind {
    /// All spaces in the order they are printed.
    pub const ALL: [LocationKind; 2] = [LocationKind::C, LocationKind::Asm];
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub filename: Option<Atom>,
    pub line_num: u32,
}

impl Location {
    pub fn new(filename: Option<Atom>, line_num: u32) -> Self {
        Self { filename, line_num }
    }

    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.line_num == 0
    }
}

/// One location per coordinate space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locations {
    c: Location,
    asm: Location,
}

impl Locations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: LocationKind) -> &Location {
        match kind {
            LocationKind::C => &self.c,
            LocationKind::Asm => &self.asm,
        }
    }

    pub fn set(&mut self, kind: LocationKind, location: Location) {
        match kind {
            LocationKind::C => self.c = location,
            LocationKind::Asm => self.asm = location,
        }
    }

    pub fn clear(&mut self) {
        self.c = Location::default();
        self.asm = Location::default();
    }
}

/// Renders the ` at 'file' line N, 'file2'` part of a diagnostic, or
/// nothing when no space has a filename.
impl fmt::Display for Locations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut emitted = false;
        for kind in LocationKind::ALL {
            let location = self.get(kind);
            let Some(filename) = location.filename.as_ref().filter(|name| !name.is_empty())
            else {
                continue;
            };
            f.write_str(if emitted { "," } else { " at" })?;
            emitted = true;
            write!(f, " '{filename}'")?;
            if location.line_num > 0 {
                write!(f, " line {}", location.line_num)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strpool::StrPool;

    #[test]
    fn empty_locations_render_nothing() {
        assert_eq!(Locations::new().to_string(), "");
    }

    #[test]
    fn renders_c_space_before_asm_space() {
        let pool = StrPool::new();
        let mut locations = Locations::new();
        locations.set(
            LocationKind::Asm,
            Location::new(Some(pool.intern("test.asm")), 25),
        );
        assert_eq!(locations.to_string(), " at 'test.asm' line 25");

        locations.set(LocationKind::C, Location::new(Some(pool.intern("test.c")), 0));
        assert_eq!(locations.to_string(), " at 'test.c', 'test.asm' line 25");
    }

    #[test]
    fn clear_resets_both_spaces() {
        let pool = StrPool::new();
        let mut locations = Locations::new();
        locations.set(LocationKind::C, Location::new(Some(pool.intern("a.c")), 3));
        locations.clear();
        assert!(locations.get(LocationKind::C).is_empty());
        assert!(locations.get(LocationKind::Asm).is_empty());
    }
}
