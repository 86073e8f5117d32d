// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::LayoutTree;

/// An iterator over the direct children of a node, in sibling order.
///
/// Created by [`LayoutTree::children`].
pub struct Children<'a, L> {
    tree: &'a LayoutTree<L>,
    current: u32,
}

impl<'a, L> Children<'a, L> {
    pub(crate) fn new(tree: &'a LayoutTree<L>, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl<L> core::fmt::Debug for Children<'_, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Children")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<L> Iterator for Children<'_, L> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_at(idx))
    }
}
