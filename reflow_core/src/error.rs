// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout pass errors.
//!
//! Only pass execution returns errors. Misuse of the tree itself (stale
//! handles, cycles, destroying a node that still has children) is a
//! programming error and panics, and invalidating a detached node is a
//! deliberate no-op rather than an error.

use thiserror::Error;

use crate::layout::{LayoutPhase, NodeId};

/// Failure of a layout pass.
///
/// `E` is the element's [`Layoutable::Error`](crate::layout::Layoutable::Error).
/// Callback failures carry it unchanged.
#[derive(Debug, Error)]
pub enum LayoutError<E> {
    /// A pass was requested while another pass on the same tree had not
    /// finished.
    #[error("layout pass requested while the tree is {phase:?}")]
    ReentrantPass {
        /// Phase the tree was in when the request arrived.
        phase: LayoutPhase,
    },
    /// A measure callback failed. The node stays measure-invalid and is not
    /// re-queued.
    #[error("measure failed for {node:?}")]
    Measure {
        /// The node the manager was measuring. The failure may have come from
        /// a descendant measured by its callback.
        node: NodeId,
        /// The callback's error.
        #[source]
        source: E,
    },
    /// An arrange callback failed. The node stays arrange-invalid and is not
    /// re-queued.
    #[error("arrange failed for {node:?}")]
    Arrange {
        /// The node the manager was arranging.
        node: NodeId,
        /// The callback's error.
        #[source]
        source: E,
    },
    /// The pass kept re-invalidating the same node and was abandoned.
    #[error("layout did not settle: {node:?} was processed {visits} times in one pass")]
    Unsettled {
        /// The node that exceeded
        /// [`LayoutConfig::max_node_visits`](crate::layout::LayoutConfig::max_node_visits).
        node: NodeId,
        /// How many times it had been processed.
        visits: u32,
    },
}

impl<E> LayoutError<E> {
    /// Returns the node the error is about, if any.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::ReentrantPass { .. } => None,
            Self::Measure { node, .. }
            | Self::Arrange { node, .. }
            | Self::Unsettled { node, .. } => Some(*node),
        }
    }
}
