// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node model: one declared unit of computation.

use alloc::boxed::Box;
use core::fmt;

use crate::flags::Flags;
use crate::graph::ValidationGraph;

/// Boxed validation callback stored per node.
pub(crate) type Callback<C> = Box<dyn FnMut(&mut C, &mut ValidationGraph<C>)>;

pub(crate) struct Node<C> {
    /// The node's own single-bit identity.
    pub(crate) flag: Flags,
    /// Flags that must be valid before this node runs, as declared.
    pub(crate) dependencies_self: Flags,
    /// Flags invalidated together with this node, as declared.
    pub(crate) dependents_self: Flags,
    /// Transitive upstream closure, own flag included.
    pub(crate) dependencies: Flags,
    /// Transitive downstream closure, own flag included.
    pub(crate) dependents: Flags,
    /// `None` only while the callback is running.
    pub(crate) on_validate: Option<Callback<C>>,
    pub(crate) is_valid: bool,
    pub(crate) validated_count: u64,
    /// Graph generation of the last run; 0 if it never ran.
    pub(crate) generation: u64,
}

impl<C> Node<C> {
    pub(crate) fn new(
        flag: Flags,
        dependencies: Flags,
        dependents: Flags,
        on_validate: Callback<C>,
    ) -> Self {
        Self {
            flag,
            dependencies_self: dependencies,
            dependents_self: dependents,
            dependencies: flag | dependencies,
            dependents: flag | dependents,
            on_validate: Some(on_validate),
            is_valid: false,
            validated_count: 0,
            generation: 0,
        }
    }

    /// Drops the compiled closures back to the declared relations.
    pub(crate) fn reset_closure(&mut self) {
        self.dependencies = self.flag | self.dependencies_self;
        self.dependents = self.flag | self.dependents_self;
    }

    /// Every flag this node's declaration references.
    pub(crate) fn referenced(&self) -> Flags {
        self.dependencies_self | self.dependents_self
    }
}

impl<C> fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("flag", &self.flag)
            .field("dependencies_self", &self.dependencies_self)
            .field("dependents_self", &self.dependents_self)
            .field("dependencies", &self.dependencies)
            .field("dependents", &self.dependents)
            .field("is_valid", &self.is_valid)
            .field("validated_count", &self.validated_count)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
