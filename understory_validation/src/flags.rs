// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flag bitmasks identifying units of derivable state.

use alloc::vec::Vec;
use core::fmt;

use crate::names::{DisplayFlags, ReservedNames};

bitflags::bitflags! {
    /// A set of validation flags packed into a `u32`.
    ///
    /// A single bit identifies one unit of derivable state (one node of a
    /// [`ValidationGraph`](crate::ValidationGraph)). Any combination of bits is
    /// a set of such units, used for dependency masks and for the arguments of
    /// [`invalidate`](crate::ValidationGraph::invalidate) and
    /// [`validate`](crate::ValidationGraph::validate).
    ///
    /// The low byte is reserved for concerns shared by every component
    /// ([`LAYOUT`](Self::LAYOUT), [`TRANSFORM`](Self::TRANSFORM), ...). Use
    /// [`Flags::user`] for component-specific state so it never collides with
    /// the reserved bits.
    ///
    /// # Example
    ///
    /// ```
    /// use understory_validation::Flags;
    ///
    /// const TEXT: Flags = Flags::user(0);
    /// const GLYPHS: Flags = Flags::user(1);
    ///
    /// let set = Flags::LAYOUT | TEXT;
    /// assert!(set.contains(Flags::LAYOUT));
    /// assert!(!set.intersects(GLYPHS));
    /// assert!(TEXT.is_single());
    /// assert!(!set.is_single());
    /// ```
    #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct Flags: u32 {
        /// Layout of the component (size and child placement).
        const LAYOUT = 1 << 0;
        /// Local-to-parent transform.
        const TRANSFORM = 1 << 1;
        /// Bounding boxes derived from layout and transform.
        const BOUNDS = 1 << 2;
        /// Cached vertex data handed to the renderer.
        const VERTICES = 1 << 3;
        /// Resolved style values.
        const STYLE = 1 << 4;

        // Caller-defined bits are retained.
        const _ = !0;
    }
}

impl Flags {
    /// Index of the first bit available for caller-defined flags.
    pub const FIRST_USER_BIT: u32 = 8;

    /// Every bit reserved for shared framework concerns.
    pub const RESERVED: Self = Self::from_bits_retain((1 << Self::FIRST_USER_BIT) - 1);

    /// Returns the single flag for bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 32`.
    #[must_use]
    pub const fn bit(index: u32) -> Self {
        assert!(index < u32::BITS, "flag bit index must be less than 32");
        Self::from_bits_retain(1 << index)
    }

    /// Returns the `index`-th caller-defined flag, counted from
    /// [`FIRST_USER_BIT`](Self::FIRST_USER_BIT).
    ///
    /// # Panics
    ///
    /// Panics if the resulting bit does not fit in 32 bits.
    #[must_use]
    pub const fn user(index: u32) -> Self {
        assert!(
            index < u32::BITS - Self::FIRST_USER_BIT,
            "user flag index must be less than 24"
        );
        Self::bit(Self::FIRST_USER_BIT + index)
    }

    /// Returns `true` if exactly one bit is set.
    #[must_use]
    #[inline]
    pub const fn is_single(self) -> bool {
        is_power_of_two(self.bits())
    }

    /// Returns the index of the lowest set bit, if any.
    #[must_use]
    #[inline]
    pub const fn lowest_bit_index(self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(self.bits().trailing_zeros())
        }
    }

    /// Returns an iterator over the single-bit flags in this set, lowest first.
    #[must_use]
    pub const fn singles(self) -> SingleFlags {
        SingleFlags { bits: self.bits() }
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Flags")
            .field(&format_args!("{}", DisplayFlags::new(*self, &ReservedNames)))
            .finish()
    }
}

/// An iterator over the single-bit flags of a [`Flags`] set.
///
/// Created by [`Flags::singles`].
#[derive(Clone, Debug)]
pub struct SingleFlags {
    bits: u32,
}

impl Iterator for SingleFlags {
    type Item = Flags;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        let lowest = self.bits & self.bits.wrapping_neg();
        self.bits &= !lowest;
        Some(Flags::from_bits_retain(lowest))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.bits.count_ones() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for SingleFlags {}

/// Returns `true` if `mask` contains every bit of `flags`.
#[must_use]
#[inline]
pub const fn contains_all_flags(mask: Flags, flags: Flags) -> bool {
    mask.bits() & flags.bits() == flags.bits()
}

/// Returns `true` if `mask` shares at least one bit with `flags`.
#[must_use]
#[inline]
pub const fn contains_any_flags(mask: Flags, flags: Flags) -> bool {
    mask.bits() & flags.bits() != 0
}

/// Returns `true` if `value` has exactly one bit set.
///
/// Zero is not a power of two.
#[must_use]
#[inline]
pub const fn is_power_of_two(value: u32) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// Expands `mask` into its single-bit flags, lowest bit first.
#[must_use]
pub fn flags_to_list(mask: Flags) -> Vec<Flags> {
    mask.singles().collect()
}
