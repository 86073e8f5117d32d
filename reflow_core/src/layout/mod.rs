// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout tree, invalidation, and pass execution.
//!
//! A *node* is an element in a layout tree. Each node has:
//!
//! - An identity ([`NodeId`]): a generational handle that becomes stale when
//!   the node is destroyed, preventing use-after-free bugs at the API level.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//!   A node is *attached* when its parent chain reaches the tree's root.
//! - An element implementing [`Layoutable`], which owns the actual sizing
//!   logic.
//! - Layout state: measure and arrange validity, the last desired size, and
//!   the constraint and rectangle it was last measured and arranged with.
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles
//! for cache-friendly traversal.
//!
//! # Invalidation
//!
//! [`invalidate_measure`](LayoutTree::invalidate_measure) marks a node and
//! every ancestor whose measure was valid; each attached node touched goes
//! into the depth-ordered [`InvalidationQueue`]s owned by the tree's
//! [`LayoutManager`]. [`invalidate_arrange`](LayoutTree::invalidate_arrange)
//! is local to the node.
//!
//! # Passes
//!
//! [`execute_initial_layout_pass`](LayoutTree::execute_initial_layout_pass)
//! installs the root; [`execute_layout_pass`](LayoutTree::execute_layout_pass)
//! drains both queues, shallowest first, until nothing is left. See the
//! `manager` module docs on [`LayoutManager`] for the loop itself.

mod changes;
#[cfg(test)]
pub(crate) mod fixtures;
mod id;
mod layoutable;
mod manager;
mod queue;
mod store;
mod traverse;

pub use changes::LayoutChanges;
pub use id::{INVALID, NodeId};
pub use layoutable::{LayoutCx, Layoutable};
pub use manager::{LayoutConfig, LayoutManager, LayoutPhase, PassStats};
pub use queue::InvalidationQueue;
pub use store::LayoutTree;
pub use traverse::Children;
