// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Validation: a flag-keyed validation graph for derived UI state.
//!
//! A UI component keeps several pieces of derived state: layout from its
//! inputs, a transform from its layout, bounds from both, cached vertices from
//! the bounds. This crate lets the component declare those computations once as
//! nodes of a [`ValidationGraph`], mark inputs outdated with
//! [`invalidate`](ValidationGraph::invalidate), and bring any subset of its
//! state up to date with [`validate`](ValidationGraph::validate), which runs
//! each outdated computation once, upstream first.
//!
//! - **Flags** ([`Flags`]): single bits naming units of state, packed in a
//!   `u32`. The low byte is reserved for shared concerns
//!   ([`Flags::LAYOUT`], [`Flags::TRANSFORM`], ...); [`Flags::user`] hands out
//!   the rest.
//! - **Nodes**: one per flag, declaring dependencies (flags that must be
//!   valid first) and dependents (flags dirtied whenever this one is).
//! - **Compilation**: the declarations are closed transitively and ordered
//!   topologically, lazily on the first call that needs it. Duplicate flags,
//!   flags referenced but never declared and cycles are reported as
//!   [`GraphError`]s.
//! - **Names** ([`FlagNames`]): optional names for diagnostics.
//! - **Properties** ([`InvalidateOnWrite`], [`ValidateOnRead`]): inputs that
//!   invalidate on change and outputs that validate on read.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_validation::{Flags, ValidationGraph};
//!
//! #[derive(Default)]
//! struct Panel {
//!     width: f64,
//!     scale: f64,
//!     layout_width: f64,
//!     transform_scale: f64,
//!     bounds_width: f64,
//! }
//!
//! let mut graph = ValidationGraph::<Panel>::new();
//! graph.add_node_simple(Flags::LAYOUT, |panel, _| panel.layout_width = panel.width);
//! graph.add_node_with_dependencies(Flags::TRANSFORM, Flags::LAYOUT, |panel, _| {
//!     panel.transform_scale = panel.scale;
//! });
//! graph.add_node_with_dependencies(
//!     Flags::BOUNDS,
//!     Flags::LAYOUT | Flags::TRANSFORM,
//!     |panel, _| panel.bounds_width = panel.layout_width * panel.transform_scale,
//! );
//!
//! let mut panel = Panel { width: 10.0, scale: 2.0, ..Panel::default() };
//!
//! // Everything starts invalid; asking for bounds runs all three nodes.
//! let ran = graph.validate(&mut panel, Flags::BOUNDS);
//! assert_eq!(ran, Flags::LAYOUT | Flags::TRANSFORM | Flags::BOUNDS);
//! assert_eq!(panel.bounds_width, 20.0);
//!
//! // A new scale only outdates the transform and what depends on it.
//! panel.scale = 3.0;
//! assert_eq!(graph.invalidate(Flags::TRANSFORM), Flags::TRANSFORM | Flags::BOUNDS);
//! graph.validate(&mut panel, Flags::BOUNDS);
//! assert_eq!(panel.bounds_width, 30.0);
//! assert_eq!(graph.validated_count(Flags::LAYOUT), 1);
//! ```
//!
//! ## Re-entrancy
//!
//! Callbacks receive the graph, so a node can dirty state downstream of itself
//! while it runs:
//!
//! ```rust
//! use understory_validation::{Flags, ValidationGraph};
//!
//! let mut graph = ValidationGraph::<()>::new();
//! graph.add_node_with_dependents(Flags::LAYOUT, Flags::VERTICES, |_, graph| {
//!     graph.invalidate(Flags::VERTICES);
//! });
//! graph.add_node_simple(Flags::VERTICES, |_, _| {});
//! graph.validate_unit(Flags::VERTICES);
//! assert!(graph.is_valid(Flags::VERTICES));
//! ```
//!
//! Invalidating anything else from a callback, validating flags that are
//! still outdated, or changing the graph shape is an error. How strictly the
//! first two are checked is set by [`ReentrancyCheck`].
//!
//! ## Errors
//!
//! Most operations come in two forms: the plain one panics with the
//! [`GraphError`] message, the `try_` one returns it. Every error describes a
//! programming mistake, so the panicking form is the usual choice.
//!
//! ## Diagnostics
//!
//! Compilation, invalidation and validation emit [`tracing`] events at the
//! `debug` and `trace` levels. No subscriber is installed by this crate.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.
//!
//! ## Features
//!
//! This crate currently has no optional features.

#![no_std]

extern crate alloc;

mod error;
mod flags;
mod graph;
mod names;
mod node;
mod property;

pub use error::GraphError;
pub use flags::{
    Flags, SingleFlags, contains_all_flags, contains_any_flags, flags_to_list, is_power_of_two,
};
pub use graph::{ReentrancyCheck, ValidationGraph};
pub use names::{DisplayFlags, FlagNames, NameTable, ReservedNames, flag_to_string, flags_to_string};
pub use property::{InvalidateOnWrite, ValidateOnRead};
