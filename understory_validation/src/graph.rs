// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The validation graph: compilation, invalidation and validation.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::error::{GraphError, fail};
use crate::flags::Flags;
use crate::names::{FlagNames, ReservedNames, flags_to_string};
use crate::node::{Callback, Node};

/// Index list sized for a typical component's node count.
type Indices = SmallVec<[usize; 16]>;

/// How strictly re-entrant calls made from inside a callback are checked.
///
/// Covers invalidation of flags outside the running node's dependents and
/// nested validation of flags that are still invalid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ReentrancyCheck {
    /// Check in every build.
    #[default]
    Always,
    /// Check only when `debug_assertions` are enabled.
    ///
    /// In release builds an illegal nested validation is silently skipped and
    /// an illegal invalidation goes through.
    DebugAssert,
}

/// A flag-keyed dependency graph that lazily re-runs outdated computations.
///
/// Each node owns one single-bit [`Flags`] value, declares which flags it
/// depends on and which flags it dirties, and carries a callback that
/// recomputes its state. [`invalidate`](Self::invalidate) marks flags and
/// everything downstream of them dirty; [`validate`](Self::validate) runs
/// the dirty callbacks needed for the requested flags, upstream first, each
/// exactly once.
///
/// Callbacks receive the owner context `C` (the state they recompute) and the
/// graph itself, so they may invalidate flags downstream of their own node.
///
/// # Example
///
/// ```
/// use understory_validation::{Flags, ValidationGraph};
///
/// let mut graph = ValidationGraph::<Vec<Flags>>::new();
/// graph.add_node_simple(Flags::LAYOUT, |log, _| log.push(Flags::LAYOUT));
/// graph.add_node_with_dependencies(Flags::TRANSFORM, Flags::LAYOUT, |log, _| {
///     log.push(Flags::TRANSFORM);
/// });
///
/// let mut log = Vec::new();
/// let ran = graph.validate(&mut log, Flags::TRANSFORM);
/// assert_eq!(ran, Flags::LAYOUT | Flags::TRANSFORM);
/// assert_eq!(log, [Flags::LAYOUT, Flags::TRANSFORM]);
///
/// // Invalidation reaches downstream nodes only.
/// assert_eq!(graph.invalidate(Flags::TRANSFORM), Flags::TRANSFORM);
/// assert!(graph.is_valid(Flags::LAYOUT));
/// ```
pub struct ValidationGraph<C = ()> {
    /// Nodes in declaration order.
    nodes: Vec<Node<C>>,
    /// Execution order as indices into `nodes`; meaningful only when `compiled`.
    order: Indices,
    compiled: bool,
    all_flags: Flags,
    invalid_flags: Flags,
    /// Index into `nodes` of the node whose callback is running.
    current: Option<usize>,
    names: Box<dyn FlagNames>,
    reentrancy_check: ReentrancyCheck,
    /// Bumped on every callback run and every node added or removed.
    generation: u64,
    /// Generation of the last node added or removed.
    shape_generation: u64,
}

impl<C> Default for ValidationGraph<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ValidationGraph<C> {
    /// Creates an empty graph naming flags with [`ReservedNames`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            order: Indices::new(),
            compiled: true,
            all_flags: Flags::empty(),
            invalid_flags: Flags::empty(),
            current: None,
            names: Box::new(ReservedNames),
            reentrancy_check: ReentrancyCheck::default(),
            generation: 0,
            shape_generation: 0,
        }
    }

    /// Sets the names used in error messages and diagnostics.
    #[must_use]
    pub fn with_names(mut self, names: impl FlagNames + 'static) -> Self {
        self.names = Box::new(names);
        self
    }

    /// Sets how re-entrant calls are checked.
    #[must_use]
    pub fn with_reentrancy_check(mut self, check: ReentrancyCheck) -> Self {
        self.reentrancy_check = check;
        self
    }

    /// Returns the configured re-entrancy check.
    #[must_use]
    pub fn reentrancy_check(&self) -> ReentrancyCheck {
        self.reentrancy_check
    }

    /// Returns the names used for diagnostics.
    #[must_use]
    pub fn names(&self) -> &dyn FlagNames {
        &*self.names
    }

    /// Renders `flags` with this graph's names.
    #[must_use]
    pub fn flags_to_string(&self, flags: Flags) -> String {
        flags_to_string(flags, &*self.names)
    }

    // -------------------------------------------------------------------------
    // Declaration
    // -------------------------------------------------------------------------

    /// Declares a node.
    ///
    /// `flag` must be a single bit. Every bit of `dependencies | dependents`
    /// must belong to some node by the time the graph compiles, which happens
    /// lazily on the next [`invalidate`](Self::invalidate) or
    /// [`validate`](Self::validate). The new node starts invalid.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NotSingleFlag`] if `flag` is zero or has several bits.
    /// - [`GraphError::MutationDuringValidation`] if called from a callback.
    pub fn try_add_node(
        &mut self,
        flag: Flags,
        dependencies: Flags,
        dependents: Flags,
        on_validate: impl FnMut(&mut C, &mut Self) + 'static,
    ) -> Result<(), GraphError> {
        self.ensure_idle(flag)?;
        if !flag.is_single() {
            return Err(GraphError::NotSingleFlag {
                flag,
                name: self.flags_to_string(flag),
            });
        }
        self.nodes.push(Node::new(
            flag,
            dependencies,
            dependents,
            Box::new(on_validate),
        ));
        self.compiled = false;
        self.all_flags |= flag;
        self.invalid_flags |= flag;
        self.bump_shape();
        Ok(())
    }

    /// Declares a node, panicking on error.
    ///
    /// See [`try_add_node`](Self::try_add_node).
    ///
    /// # Panics
    ///
    /// Panics if `flag` is not a single bit or if called from a callback.
    #[track_caller]
    pub fn add_node(
        &mut self,
        flag: Flags,
        dependencies: Flags,
        dependents: Flags,
        on_validate: impl FnMut(&mut C, &mut Self) + 'static,
    ) {
        if let Err(err) = self.try_add_node(flag, dependencies, dependents, on_validate) {
            fail(err);
        }
    }

    /// Declares a node with no dependencies or dependents.
    #[track_caller]
    pub fn add_node_simple(
        &mut self,
        flag: Flags,
        on_validate: impl FnMut(&mut C, &mut Self) + 'static,
    ) {
        self.add_node(flag, Flags::empty(), Flags::empty(), on_validate);
    }

    /// Declares a node that depends on `dependencies`.
    #[track_caller]
    pub fn add_node_with_dependencies(
        &mut self,
        flag: Flags,
        dependencies: Flags,
        on_validate: impl FnMut(&mut C, &mut Self) + 'static,
    ) {
        self.add_node(flag, dependencies, Flags::empty(), on_validate);
    }

    /// Declares a node that dirties `dependents` when it becomes invalid.
    #[track_caller]
    pub fn add_node_with_dependents(
        &mut self,
        flag: Flags,
        dependents: Flags,
        on_validate: impl FnMut(&mut C, &mut Self) + 'static,
    ) {
        self.add_node(flag, Flags::empty(), dependents, on_validate);
    }

    /// Removes the node declared with `flag`.
    ///
    /// Returns `true` if a node was found and removed. Other nodes that still
    /// reference `flag` make the next compilation fail unless it is declared
    /// again.
    ///
    /// # Panics
    ///
    /// Panics if called from a callback.
    #[track_caller]
    pub fn remove_node(&mut self, flag: Flags) -> bool {
        if let Err(err) = self.ensure_idle(flag) {
            fail(err);
        }
        let Some(index) = self.index_of(flag) else {
            return false;
        };
        self.nodes.remove(index);
        self.compiled = false;
        self.all_flags = self
            .nodes
            .iter()
            .fold(Flags::empty(), |all, node| all | node.flag);
        self.invalid_flags &= self.all_flags;
        self.bump_shape();
        true
    }

    /// Adds `extra` to the declared dependencies of `flag`.
    ///
    /// Returns `false` if no node has `flag`.
    ///
    /// # Panics
    ///
    /// Panics if called from a callback.
    #[track_caller]
    pub fn add_dependencies(&mut self, flag: Flags, extra: Flags) -> bool {
        self.update_node(flag, |node| node.dependencies_self |= extra)
    }

    /// Adds `extra` to the declared dependents of `flag`.
    ///
    /// Returns `false` if no node has `flag`.
    ///
    /// # Panics
    ///
    /// Panics if called from a callback.
    #[track_caller]
    pub fn add_dependents(&mut self, flag: Flags, extra: Flags) -> bool {
        self.update_node(flag, |node| node.dependents_self |= extra)
    }

    /// Removes `subset` from the declared dependencies of `flag`.
    ///
    /// Returns `false` if no node has `flag`.
    ///
    /// # Panics
    ///
    /// Panics if called from a callback.
    #[track_caller]
    pub fn remove_dependencies(&mut self, flag: Flags, subset: Flags) -> bool {
        self.update_node(flag, |node| node.dependencies_self.remove(subset))
    }

    /// Removes `subset` from the declared dependents of `flag`.
    ///
    /// Returns `false` if no node has `flag`.
    ///
    /// # Panics
    ///
    /// Panics if called from a callback.
    #[track_caller]
    pub fn remove_dependents(&mut self, flag: Flags, subset: Flags) -> bool {
        self.update_node(flag, |node| node.dependents_self.remove(subset))
    }

    #[track_caller]
    fn update_node(&mut self, flag: Flags, update: impl FnOnce(&mut Node<C>)) -> bool {
        if let Err(err) = self.ensure_idle(flag) {
            fail(err);
        }
        let Some(index) = self.index_of(flag) else {
            return false;
        };
        update(&mut self.nodes[index]);
        self.compiled = false;
        true
    }

    fn ensure_idle(&self, flag: Flags) -> Result<(), GraphError> {
        match self.current {
            Some(current) => {
                let current = self.nodes[current].flag;
                Err(GraphError::MutationDuringValidation {
                    flag,
                    name: self.flags_to_string(flag),
                    current,
                    current_name: self.flags_to_string(current),
                })
            }
            None => Ok(()),
        }
    }

    fn bump_shape(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.shape_generation = self.generation;
    }

    fn index_of(&self, flag: Flags) -> Option<usize> {
        self.nodes.iter().position(|node| node.flag == flag)
    }

    // -------------------------------------------------------------------------
    // Compilation
    // -------------------------------------------------------------------------

    /// Returns `true` if the execution order is up to date with the declarations.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Compiles the declarations into an execution order.
    ///
    /// This runs automatically before invalidation and validation; call it
    /// directly to surface declaration errors early.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DuplicateFlag`] if two nodes share a flag.
    /// - [`GraphError::MissingFlags`] if a mask references an undeclared flag.
    /// - [`GraphError::Cycle`] if the declarations are cyclic.
    pub fn try_compile(&mut self) -> Result<(), GraphError> {
        self.compiled = false;
        self.order.clear();

        let mut declared = Flags::empty();
        for node in &self.nodes {
            if declared.intersects(node.flag) {
                return Err(GraphError::DuplicateFlag {
                    flag: node.flag,
                    name: self.flags_to_string(node.flag),
                });
            }
            declared |= node.flag;
        }
        for node in &self.nodes {
            let missing = node.referenced().difference(declared);
            if !missing.is_empty() {
                return Err(GraphError::MissingFlags {
                    node: node.flag,
                    node_name: self.flags_to_string(node.flag),
                    missing,
                    missing_names: self.flags_to_string(missing),
                });
            }
        }

        for node in &mut self.nodes {
            node.reset_closure();
        }
        let mut linked = Indices::new();
        for index in 0..self.nodes.len() {
            self.link(index, &linked)?;
            linked.push(index);
        }
        // Catches a node that reaches itself through flags linked after it.
        if let Some(node) = self
            .nodes
            .iter()
            .find(|node| node.dependencies.intersects(node.dependents.difference(node.flag)))
        {
            return Err(self.cycle_error(node.flag, node.dependencies, node.dependents));
        }

        for index in 0..self.nodes.len() {
            self.place(index);
        }
        self.compiled = true;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let order: Vec<Flags> = self.order.iter().map(|&i| self.nodes[i].flag).collect();
            tracing::debug!(nodes = self.nodes.len(), ?order, "compiled validation graph");
        }
        Ok(())
    }

    /// Compiles the declarations, panicking on error.
    ///
    /// See [`try_compile`](Self::try_compile).
    ///
    /// # Panics
    ///
    /// Panics if the declarations are malformed.
    #[track_caller]
    pub fn compile(&mut self) {
        if let Err(err) = self.try_compile() {
            fail(err);
        }
    }

    fn ensure_compiled(&mut self) -> Result<(), GraphError> {
        if self.compiled {
            Ok(())
        } else {
            self.try_compile()
        }
    }

    /// Merges the closures of node `index` with the already linked nodes.
    ///
    /// The linked nodes are transitively closed among themselves, so any node
    /// whose downstream set meets the new node's upstream set is upstream of it
    /// (and symmetrically), and one pass over them is enough.
    fn link(&mut self, index: usize, linked: &[usize]) -> Result<(), GraphError> {
        let (flag, dependencies, dependents) = {
            let node = &self.nodes[index];
            (node.flag, node.dependencies, node.dependents)
        };

        let mut upstream = Indices::new();
        let mut downstream = Indices::new();
        let mut all_dependencies = dependencies;
        let mut all_dependents = dependents;
        let mut contradictory = false;
        for &other in linked {
            let node = &self.nodes[other];
            let is_upstream = node.dependents.intersects(dependencies);
            let is_downstream = node.dependencies.intersects(dependents);
            contradictory |= is_upstream && is_downstream;
            if is_upstream {
                upstream.push(other);
                all_dependencies |= node.dependencies;
            }
            if is_downstream {
                downstream.push(other);
                all_dependents |= node.dependents;
            }
        }
        if contradictory {
            return Err(self.cycle_error(flag, all_dependencies, all_dependents));
        }

        for &up in &upstream {
            self.nodes[up].dependents |= all_dependents;
        }
        for &down in &downstream {
            self.nodes[down].dependencies |= all_dependencies;
        }
        let node = &mut self.nodes[index];
        node.dependencies = all_dependencies;
        node.dependents = all_dependents;
        Ok(())
    }

    /// Inserts node `index` into the order right before its first downstream node.
    ///
    /// With closed relations every upstream node already placed sits before
    /// every downstream node placed, so this position follows all of them.
    fn place(&mut self, index: usize) {
        let flag = self.nodes[index].flag;
        let nodes = &self.nodes;
        let position = self
            .order
            .iter()
            .position(|&other| nodes[other].dependencies.intersects(flag))
            .unwrap_or(self.order.len());
        debug_assert!(
            self.order[position..]
                .iter()
                .all(|&other| !self.nodes[index].dependencies.intersects(self.nodes[other].flag)),
            "upstream node placed after its dependent"
        );
        self.order.insert(position, index);
    }

    fn cycle_error(&self, node: Flags, dependencies: Flags, dependents: Flags) -> GraphError {
        let after = dependencies.difference(node);
        let before = dependents.difference(node);
        GraphError::Cycle {
            node,
            node_name: self.flags_to_string(node),
            after,
            after_names: self.flags_to_string(after),
            before,
            before_names: self.flags_to_string(before),
        }
    }

    // -------------------------------------------------------------------------
    // Invalidation
    // -------------------------------------------------------------------------

    /// Marks `flags` and everything downstream of them invalid.
    ///
    /// Returns the flags that actually changed from valid to invalid; flags
    /// that were already invalid are skipped.
    ///
    /// From inside a callback only flags downstream of the running node may
    /// be invalidated.
    ///
    /// # Errors
    ///
    /// - Any [`try_compile`](Self::try_compile) error if the graph is stale.
    /// - [`GraphError::IllegalInvalidation`] if a callback invalidates a flag
    ///   that is not downstream of its own node.
    pub fn try_invalidate(&mut self, flags: Flags) -> Result<Flags, GraphError> {
        self.ensure_compiled()?;
        let mut pending = flags & self.all_flags.difference(self.invalid_flags);
        if pending.is_empty() {
            return Ok(Flags::empty());
        }

        if let Some(current) = self.current
            && self.checks_enabled()
        {
            let node = &self.nodes[current];
            let illegal = pending.difference(node.dependents.difference(node.flag));
            if !illegal.is_empty() {
                return Err(GraphError::IllegalInvalidation {
                    flags: illegal,
                    names: self.flags_to_string(illegal),
                    current: node.flag,
                    current_name: self.flags_to_string(node.flag),
                });
            }
        }

        let mut invalidated = Flags::empty();
        for &index in &self.order {
            let node = &mut self.nodes[index];
            if node.is_valid && node.flag.intersects(pending) {
                node.is_valid = false;
                pending |= node.dependents;
                invalidated |= node.flag;
            }
        }
        self.invalid_flags |= invalidated;
        tracing::trace!(requested = ?flags, ?invalidated, "invalidate");
        Ok(invalidated)
    }

    /// Marks `flags` and everything downstream of them invalid, panicking on error.
    ///
    /// See [`try_invalidate`](Self::try_invalidate).
    ///
    /// # Panics
    ///
    /// Panics if the graph fails to compile or on an illegal re-entrant
    /// invalidation.
    #[track_caller]
    pub fn invalidate(&mut self, flags: Flags) -> Flags {
        match self.try_invalidate(flags) {
            Ok(invalidated) => invalidated,
            Err(err) => fail(err),
        }
    }

    /// Invalidates every node.
    ///
    /// # Panics
    ///
    /// See [`invalidate`](Self::invalidate).
    #[track_caller]
    pub fn invalidate_all(&mut self) -> Flags {
        self.invalidate(Flags::all())
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Runs every invalid node needed for `flags`, upstream first.
    ///
    /// A node runs when it is invalid and any flag downstream of it (itself
    /// included) was requested. Running a node pulls its own dependencies into
    /// the request. Returns the flags whose callbacks ran.
    ///
    /// Called from inside a callback, this only checks that everything
    /// requested is already valid and returns an empty set.
    ///
    /// If a callback panics, its node is left invalid and the pass ends, so
    /// the graph stays usable once the panic is caught.
    ///
    /// # Errors
    ///
    /// - Any [`try_compile`](Self::try_compile) error if the graph is stale.
    /// - [`GraphError::IllegalNestedValidation`] if a callback requests flags
    ///   that are still invalid.
    pub fn try_validate(&mut self, cx: &mut C, flags: Flags) -> Result<Flags, GraphError> {
        self.ensure_compiled()?;
        let requested = flags & self.all_flags;

        if let Some(current) = self.current {
            let dirty = requested & self.invalid_flags;
            if !dirty.is_empty() && self.checks_enabled() {
                let current = self.nodes[current].flag;
                return Err(GraphError::IllegalNestedValidation {
                    flags: dirty,
                    names: self.flags_to_string(dirty),
                    current,
                    current_name: self.flags_to_string(current),
                });
            }
            return Ok(Flags::empty());
        }

        if !requested.intersects(self.invalid_flags) {
            return Ok(Flags::empty());
        }

        let mut wanted = requested;
        let mut validated = Flags::empty();
        for position in 0..self.order.len() {
            let index = self.order[position];
            let node = &mut self.nodes[index];
            if node.is_valid || !node.dependents.intersects(wanted) {
                continue;
            }
            self.generation = self.generation.wrapping_add(1);
            node.is_valid = true;
            node.validated_count = node.validated_count.wrapping_add(1);
            node.generation = self.generation;
            wanted |= node.dependencies;
            let flag = node.flag;
            let callback = node.on_validate.take();
            self.invalid_flags.remove(flag);
            validated |= flag;

            tracing::trace!(?flag, "validating node");
            self.current = Some(index);
            let mut run = RunGuard {
                graph: &mut *self,
                index,
                callback,
                finished: false,
            };
            if let Some(callback) = run.callback.as_mut() {
                callback(&mut *cx, &mut *run.graph);
            }
            run.finished = true;
        }
        self.current = None;
        tracing::trace!(requested = ?flags, ?validated, "validate");
        Ok(validated)
    }

    /// Runs every invalid node needed for `flags`, panicking on error.
    ///
    /// See [`try_validate`](Self::try_validate).
    ///
    /// # Panics
    ///
    /// Panics if the graph fails to compile or on an illegal nested validation.
    #[track_caller]
    pub fn validate(&mut self, cx: &mut C, flags: Flags) -> Flags {
        match self.try_validate(cx, flags) {
            Ok(validated) => validated,
            Err(err) => fail(err),
        }
    }

    /// Validates every node.
    ///
    /// # Panics
    ///
    /// See [`validate`](Self::validate).
    #[track_caller]
    pub fn validate_all(&mut self, cx: &mut C) -> Flags {
        self.validate(cx, Flags::all())
    }

    fn checks_enabled(&self) -> bool {
        match self.reentrancy_check {
            ReentrancyCheck::Always => true,
            ReentrancyCheck::DebugAssert => cfg!(debug_assertions),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns `true` if none of the bits of `flag` is invalid.
    #[must_use]
    pub fn is_valid(&self, flag: Flags) -> bool {
        !self.invalid_flags.intersects(flag)
    }

    /// Returns how many times the callback of `flag` has run.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownFlag`] if no node has `flag`.
    pub fn try_validated_count(&self, flag: Flags) -> Result<u64, GraphError> {
        match self.index_of(flag) {
            Some(index) => Ok(self.nodes[index].validated_count),
            None => Err(GraphError::UnknownFlag {
                flag,
                name: self.flags_to_string(flag),
            }),
        }
    }

    /// Returns how many times the callback of `flag` has run.
    ///
    /// # Panics
    ///
    /// Panics if no node has `flag`.
    #[must_use]
    #[track_caller]
    pub fn validated_count(&self, flag: Flags) -> u64 {
        match self.try_validated_count(flag) {
            Ok(count) => count,
            Err(err) => fail(err),
        }
    }

    /// Returns a stamp that grows whenever a node in `flags` runs or any node
    /// is added or removed.
    ///
    /// A changed stamp means the state behind the watched flags may differ
    /// from when it was last observed. Runs of unwatched nodes leave it alone.
    #[must_use]
    pub fn validation_stamp(&self, flags: Flags) -> u64 {
        self.nodes
            .iter()
            .filter(|node| flags.contains(node.flag))
            .fold(self.shape_generation, |stamp, node| stamp.max(node.generation))
    }

    /// Returns the flag of the node whose callback is running.
    #[must_use]
    pub fn current_flag(&self) -> Option<Flags> {
        self.current.map(|index| self.nodes[index].flag)
    }

    /// Returns `true` while a validation pass is running callbacks.
    #[must_use]
    pub fn is_validating(&self) -> bool {
        self.current.is_some()
    }

    /// Returns the flags of every invalid node.
    #[must_use]
    pub fn invalid_flags(&self) -> Flags {
        self.invalid_flags
    }

    /// Returns the flags of every declared node.
    #[must_use]
    pub fn all_flags(&self) -> Flags {
        self.all_flags
    }

    /// Returns `true` if a node is declared with `flag`.
    #[must_use]
    pub fn contains(&self, flag: Flags) -> bool {
        self.index_of(flag).is_some()
    }

    /// Returns the number of declared nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node flags in execution order, compiling first if needed.
    ///
    /// # Panics
    ///
    /// Panics if the graph fails to compile.
    #[track_caller]
    pub fn order(&mut self) -> Vec<Flags> {
        if let Err(err) = self.ensure_compiled() {
            fail(err);
        }
        self.order.iter().map(|&index| self.nodes[index].flag).collect()
    }

    /// Returns the transitive dependencies of `flag`, its own flag included.
    ///
    /// Returns `None` if no node has `flag`.
    ///
    /// # Panics
    ///
    /// Panics if the graph fails to compile.
    #[track_caller]
    pub fn dependencies_of(&mut self, flag: Flags) -> Option<Flags> {
        if let Err(err) = self.ensure_compiled() {
            fail(err);
        }
        self.index_of(flag).map(|index| self.nodes[index].dependencies)
    }

    /// Returns the transitive dependents of `flag`, its own flag included.
    ///
    /// Returns `None` if no node has `flag`.
    ///
    /// # Panics
    ///
    /// Panics if the graph fails to compile.
    #[track_caller]
    pub fn dependents_of(&mut self, flag: Flags) -> Option<Flags> {
        if let Err(err) = self.ensure_compiled() {
            fail(err);
        }
        self.index_of(flag).map(|index| self.nodes[index].dependents)
    }
}

impl ValidationGraph<()> {
    /// Validates `flags` for a graph without owner context.
    ///
    /// # Panics
    ///
    /// See [`validate`](Self::validate).
    #[track_caller]
    pub fn validate_unit(&mut self, flags: Flags) -> Flags {
        self.validate(&mut (), flags)
    }
}

/// Reattaches a running node's callback when the callback returns or unwinds.
///
/// On unwind the node is marked invalid again and the pass is ended.
struct RunGuard<'a, C> {
    graph: &'a mut ValidationGraph<C>,
    index: usize,
    callback: Option<Callback<C>>,
    finished: bool,
}

impl<C> Drop for RunGuard<'_, C> {
    fn drop(&mut self) {
        let node = &mut self.graph.nodes[self.index];
        node.on_validate = self.callback.take();
        if !self.finished {
            node.is_valid = false;
            let flag = node.flag;
            self.graph.invalid_flags |= flag;
            self.graph.current = None;
        }
    }
}

impl<C> fmt::Debug for ValidationGraph<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationGraph")
            .field("all_flags", &self.all_flags)
            .field("invalid_flags", &self.invalid_flags)
            .field("current_flag", &self.current_flag())
            .field("compiled", &self.compiled)
            .field("reentrancy_check", &self.reentrancy_check)
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}
