// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property wrappers bound to validation flags.
//!
//! [`InvalidateOnWrite`] holds an input value and invalidates its flags when
//! the value actually changes. [`ValidateOnRead`] caches a derived value and
//! validates its flags before every read, recomputing only after one of the
//! watched nodes ran again.

use crate::error::{GraphError, fail};
use crate::flags::Flags;
use crate::graph::ValidationGraph;

/// An input value that invalidates `flags` when it changes.
///
/// # Example
///
/// ```
/// use understory_validation::{Flags, InvalidateOnWrite, ValidationGraph};
///
/// let mut graph = ValidationGraph::<()>::new();
/// graph.add_node_simple(Flags::LAYOUT, |_, _| {});
/// graph.validate_unit(Flags::LAYOUT);
///
/// let mut width = InvalidateOnWrite::new(100.0_f64, Flags::LAYOUT);
/// assert!(!width.set(&mut graph, 100.0));
/// assert!(graph.is_valid(Flags::LAYOUT));
///
/// assert!(width.set(&mut graph, 120.0));
/// assert!(!graph.is_valid(Flags::LAYOUT));
/// assert_eq!(*width.get(), 120.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvalidateOnWrite<T> {
    value: T,
    flags: Flags,
}

impl<T> InvalidateOnWrite<T> {
    /// Wraps `value`, invalidating `flags` on every change.
    pub const fn new(value: T, flags: Flags) -> Self {
        Self { value, flags }
    }

    /// Returns the current value.
    pub const fn get(&self) -> &T {
        &self.value
    }

    /// Returns the flags invalidated on change.
    pub const fn flags(&self) -> Flags {
        self.flags
    }

    /// Replaces the value without touching the graph.
    pub fn replace_silently(&mut self, value: T) -> T {
        core::mem::replace(&mut self.value, value)
    }

    /// Unwraps the value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: PartialEq> InvalidateOnWrite<T> {
    /// Stores `value` and invalidates the flags if it differs from the current one.
    ///
    /// Returns `true` if the value changed.
    ///
    /// # Errors
    ///
    /// Propagates [`ValidationGraph::try_invalidate`] errors. The new value is
    /// stored either way.
    pub fn try_set<C>(
        &mut self,
        graph: &mut ValidationGraph<C>,
        value: T,
    ) -> Result<bool, GraphError> {
        if self.value == value {
            return Ok(false);
        }
        self.value = value;
        graph.try_invalidate(self.flags)?;
        Ok(true)
    }

    /// Stores `value` and invalidates the flags if it differs from the current one.
    ///
    /// # Panics
    ///
    /// See [`ValidationGraph::invalidate`].
    #[track_caller]
    pub fn set<C>(&mut self, graph: &mut ValidationGraph<C>, value: T) -> bool {
        match self.try_set(graph, value) {
            Ok(changed) => changed,
            Err(err) => fail(err),
        }
    }
}

/// A derived value recomputed lazily after its flags were revalidated.
///
/// Each read validates the watched flags, then compares the graph's
/// [`validation_stamp`](ValidationGraph::validation_stamp) for them with the
/// one seen when the value was last computed.
///
/// # Example
///
/// ```
/// use understory_validation::{Flags, ValidateOnRead, ValidationGraph};
///
/// struct Label {
///     text: String,
///     width: usize,
/// }
///
/// let mut graph = ValidationGraph::<Label>::new();
/// graph.add_node_simple(Flags::LAYOUT, |label, _| label.width = label.text.len());
///
/// let mut label = Label { text: "hello".into(), width: 0 };
/// let mut padded = ValidateOnRead::new(Flags::LAYOUT);
///
/// assert_eq!(*padded.get(&mut graph, &mut label, |label| label.width + 2), 7);
///
/// label.text.push_str(" world");
/// graph.invalidate(Flags::LAYOUT);
/// assert_eq!(*padded.get(&mut graph, &mut label, |label| label.width + 2), 13);
/// ```
#[derive(Clone, Debug)]
pub struct ValidateOnRead<T> {
    value: Option<T>,
    stamp: Option<u64>,
    flags: Flags,
}

impl<T> ValidateOnRead<T> {
    /// Creates an empty cache watching `flags`.
    pub const fn new(flags: Flags) -> Self {
        Self {
            value: None,
            stamp: None,
            flags,
        }
    }

    /// Returns the watched flags.
    pub const fn flags(&self) -> Flags {
        self.flags
    }

    /// Returns the cached value without validating.
    pub const fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Drops the cached value so the next read recomputes it.
    pub fn reset(&mut self) {
        self.value = None;
        self.stamp = None;
    }

    /// Validates the watched flags and returns the value, recomputing it with
    /// `compute` if a watched node ran since the last read or the graph's
    /// nodes were added or removed.
    ///
    /// # Errors
    ///
    /// Propagates [`ValidationGraph::try_validate`] errors; the cache is left
    /// untouched.
    pub fn try_get<C>(
        &mut self,
        graph: &mut ValidationGraph<C>,
        cx: &mut C,
        compute: impl FnOnce(&C) -> T,
    ) -> Result<&T, GraphError> {
        graph.try_validate(cx, self.flags)?;
        let stamp = graph.validation_stamp(self.flags);
        if self.stamp != Some(stamp) {
            self.value = None;
            self.stamp = Some(stamp);
        }
        Ok(self.value.get_or_insert_with(|| compute(&*cx)))
    }

    /// Validates the watched flags and returns the value.
    ///
    /// # Panics
    ///
    /// See [`ValidationGraph::validate`].
    #[track_caller]
    pub fn get<C>(
        &mut self,
        graph: &mut ValidationGraph<C>,
        cx: &mut C,
        compute: impl FnOnce(&C) -> T,
    ) -> &T {
        match self.try_get(graph, cx, compute) {
            Ok(value) => value,
            Err(err) => fail(err),
        }
    }
}

impl<T> Default for ValidateOnRead<T> {
    fn default() -> Self {
        Self::new(Flags::empty())
    }
}
