// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by malformed graph declarations or illegal re-entrant calls.

use alloc::string::String;

use thiserror::Error;

use crate::flags::Flags;

/// A programming error detected by a [`ValidationGraph`](crate::ValidationGraph).
///
/// None of these are recoverable runtime conditions: a correctly declared graph
/// driven in order never produces one. The panicking operations
/// ([`invalidate`](crate::ValidationGraph::invalidate),
/// [`validate`](crate::ValidationGraph::validate), ...) panic with this error's
/// message, while the `try_` variants return it.
///
/// Every variant keeps the raw flags together with their names, rendered with
/// the graph's [`FlagNames`](crate::FlagNames) when the error was raised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// A node was declared with a flag that is not a single nonzero bit.
    #[error("node flag {name} is not a single nonzero bit")]
    NotSingleFlag {
        /// The rejected flag.
        flag: Flags,
        /// Rendered name of `flag`.
        name: String,
    },
    /// Two nodes were declared with the same flag.
    #[error("duplicate node flag {name}")]
    DuplicateFlag {
        /// The flag declared more than once.
        flag: Flags,
        /// Rendered name of `flag`.
        name: String,
    },
    /// A dependency or dependent mask references flags no node declares.
    #[error("required flags not found: {missing_names} (referenced by {node_name})")]
    MissingFlags {
        /// The node whose masks reference the missing flags.
        node: Flags,
        /// Rendered name of `node`.
        node_name: String,
        /// The referenced flags without a node.
        missing: Flags,
        /// Rendered names of `missing`.
        missing_names: String,
    },
    /// A node would have to run both before and after the same nodes.
    #[error("cyclic declaration at {node_name}: must run after {after_names} and before {before_names}")]
    Cycle {
        /// The node whose placement is contradictory.
        node: Flags,
        /// Rendered name of `node`.
        node_name: String,
        /// Everything upstream of `node`.
        after: Flags,
        /// Rendered names of `after`.
        after_names: String,
        /// Everything downstream of `node`.
        before: Flags,
        /// Rendered names of `before`.
        before_names: String,
    },
    /// A callback invalidated flags that are not downstream of its own node.
    #[error("cannot invalidate {names} while validating {current_name}")]
    IllegalInvalidation {
        /// The offending flags.
        flags: Flags,
        /// Rendered names of `flags`.
        names: String,
        /// The node being validated.
        current: Flags,
        /// Rendered name of `current`.
        current_name: String,
    },
    /// A callback requested validation of flags the running pass cannot guarantee.
    #[error("cannot validate {names} while validating {current_name}")]
    IllegalNestedValidation {
        /// The requested flags that are still invalid.
        flags: Flags,
        /// Rendered names of `flags`.
        names: String,
        /// The node being validated.
        current: Flags,
        /// Rendered name of `current`.
        current_name: String,
    },
    /// A query named a flag that has no node.
    #[error("unknown flag {name}")]
    UnknownFlag {
        /// The flag without a node.
        flag: Flags,
        /// Rendered name of `flag`.
        name: String,
    },
    /// The graph shape was changed from inside a validation callback.
    #[error("cannot change node {name} while validating {current_name}")]
    MutationDuringValidation {
        /// The node the mutation targeted.
        flag: Flags,
        /// Rendered name of `flag`.
        name: String,
        /// The node being validated.
        current: Flags,
        /// Rendered name of `current`.
        current_name: String,
    },
}

/// Panics with the message of `err`.
#[track_caller]
pub(crate) fn fail(err: GraphError) -> ! {
    panic!("{err}")
}
