// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change reporting for hosts.
//!
//! Layout passes record what they actually changed into the
//! [dirty channels](crate::dirty). [`LayoutTree::take_changes`] drains them:
//!
//! 1. **DESIRED_SIZE**: Nodes whose measure returned a new size.
//! 2. **BOUNDS**: Nodes arranged at a new rectangle.
//! 3. **TOPOLOGY**: Drained only to set
//!    [`topology_changed`](LayoutChanges::topology_changed).
//!
//! [`LayoutChanges`] uses raw slot indices (`u32`) rather than [`NodeId`]
//! handles so that hosts can read results through the `*_at()` accessors
//! (e.g. [`bounds_at`](super::LayoutTree::bounds_at)) without paying for
//! generation checks on every access.
//!
//! [`NodeId`]: super::NodeId

use alloc::vec::Vec;

use super::store::LayoutTree;
use crate::dirty;

/// Everything that changed since the previous [`LayoutTree::take_changes`].
#[derive(Clone, Debug, Default)]
pub struct LayoutChanges {
    /// Nodes whose desired size changed.
    pub desired_sizes: Vec<u32>,
    /// Nodes whose arranged rectangle changed.
    pub bounds: Vec<u32>,
    /// Nodes created since the last take.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last take.
    pub removed: Vec<u32>,
    /// Whether any node was created, destroyed, attached, or detached.
    pub topology_changed: bool,
}

impl LayoutChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.desired_sizes.clear();
        self.bounds.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.desired_sizes.is_empty()
            && self.bounds.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl<L> LayoutTree<L> {
    /// Drains the change channels and returns what changed since the last
    /// call.
    pub fn take_changes(&mut self) -> LayoutChanges {
        let mut changes = LayoutChanges::default();
        self.take_changes_into(&mut changes);
        changes
    }

    /// Like [`take_changes`](Self::take_changes), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn take_changes_into(&mut self, changes: &mut LayoutChanges) {
        changes.clear();

        changes.desired_sizes = self
            .dirty
            .drain(dirty::DESIRED_SIZE)
            .deterministic()
            .run()
            .collect();

        changes.bounds = self
            .dirty
            .drain(dirty::BOUNDS)
            .deterministic()
            .run()
            .collect();

        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();

        // Move lifecycle lists.
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }
}
