// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable flag names for diagnostics.
//!
//! The graph never interprets flag meaning. Names only show up in error
//! messages and `Debug` output, and owners inject their own mapping through
//! [`FlagNames`] so their bits read as `TEXT` rather than `bit 8`.

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use core::fmt;

use crate::flags::Flags;

/// Maps single-bit flags to display names.
///
/// Returning `None` falls back to the positional rendering `bit N`.
///
/// Any `Fn(Flags) -> Option<&'static str>` closure is a `FlagNames`:
///
/// ```
/// use understory_validation::{Flags, flags_to_string};
///
/// const TEXT: Flags = Flags::user(0);
///
/// let names = |flag: Flags| (flag == TEXT).then_some("TEXT");
/// assert_eq!(flags_to_string(TEXT | Flags::user(1), &names), "TEXT | bit 9");
/// ```
pub trait FlagNames {
    /// Returns the name of the single-bit `flag`, if known.
    fn name(&self, flag: Flags) -> Option<Cow<'static, str>>;
}

impl<F> FlagNames for F
where
    F: Fn(Flags) -> Option<&'static str>,
{
    fn name(&self, flag: Flags) -> Option<Cow<'static, str>> {
        self(flag).map(Cow::Borrowed)
    }
}

/// Names the reserved framework bits and nothing else.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReservedNames;

const RESERVED: [(Flags, &str); 5] = [
    (Flags::LAYOUT, "LAYOUT"),
    (Flags::TRANSFORM, "TRANSFORM"),
    (Flags::BOUNDS, "BOUNDS"),
    (Flags::VERTICES, "VERTICES"),
    (Flags::STYLE, "STYLE"),
];

impl FlagNames for ReservedNames {
    fn name(&self, flag: Flags) -> Option<Cow<'static, str>> {
        RESERVED
            .iter()
            .find(|(reserved, _)| *reserved == flag)
            .map(|(_, name)| Cow::Borrowed(*name))
    }
}

/// A static name table layered over [`ReservedNames`].
///
/// # Example
///
/// ```
/// use understory_validation::{Flags, NameTable, flags_to_string};
///
/// const TEXT: Flags = Flags::user(0);
/// const NAMES: NameTable = NameTable::new(&[(TEXT, "TEXT")]);
///
/// assert_eq!(flags_to_string(Flags::LAYOUT | TEXT, &NAMES), "LAYOUT | TEXT");
/// ```
#[derive(Copy, Clone, Debug)]
pub struct NameTable {
    entries: &'static [(Flags, &'static str)],
}

impl NameTable {
    /// Creates a table from `(flag, name)` pairs.
    #[must_use]
    pub const fn new(entries: &'static [(Flags, &'static str)]) -> Self {
        Self { entries }
    }
}

impl FlagNames for NameTable {
    fn name(&self, flag: Flags) -> Option<Cow<'static, str>> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == flag)
            .map(|(_, name)| Cow::Borrowed(*name))
            .or_else(|| ReservedNames.name(flag))
    }
}

/// Displays a flag set as its names joined with `" | "`.
///
/// The empty set renders as `(none)`.
pub struct DisplayFlags<'a> {
    flags: Flags,
    names: &'a dyn FlagNames,
}

impl<'a> DisplayFlags<'a> {
    /// Wraps `flags` for display with `names`.
    #[must_use]
    pub fn new(flags: Flags, names: &'a dyn FlagNames) -> Self {
        Self { flags, names }
    }
}

impl fmt::Debug for DisplayFlags<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayFlags")
            .field("flags", &self.flags.bits())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DisplayFlags<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flags.is_empty() {
            return f.write_str("(none)");
        }
        for (i, flag) in self.flags.singles().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write_flag(f, flag, self.names)?;
        }
        Ok(())
    }
}

fn write_flag(f: &mut fmt::Formatter<'_>, flag: Flags, names: &dyn FlagNames) -> fmt::Result {
    match names.name(flag) {
        Some(name) => f.write_str(&name),
        None => write!(f, "bit {}", flag.bits().trailing_zeros()),
    }
}

/// Renders a single flag.
///
/// A mask with several bits is rendered like [`flags_to_string`].
#[must_use]
pub fn flag_to_string(flag: Flags, names: &dyn FlagNames) -> String {
    if flag.is_single() {
        match names.name(flag) {
            Some(name) => name.into_owned(),
            None => alloc::format!("bit {}", flag.bits().trailing_zeros()),
        }
    } else {
        flags_to_string(flag, names)
    }
}

/// Renders every flag of `flags`, lowest bit first, joined with `" | "`.
#[must_use]
pub fn flags_to_string(flags: Flags, names: &dyn FlagNames) -> String {
    DisplayFlags::new(flags, names).to_string()
}
