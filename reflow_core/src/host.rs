// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for consumers of layout results.
//!
//! A *host* is whatever sits on top of a [`LayoutTree`]: a window, a test
//! harness, a renderer that positions native views. Reflow leaves the when
//! and the how of pass scheduling to the host. A typical host:
//!
//! - **Owns the root**: Installs it once with
//!   [`execute_initial_layout_pass`](LayoutTree::execute_initial_layout_pass)
//!   and keeps its [`RootConstraints`](crate::root::RootConstraints) current
//!   as the client area changes.
//!
//! - **Schedules passes**: Calls
//!   [`execute_layout_pass`](LayoutTree::execute_layout_pass) when it is
//!   ready for new geometry, e.g. once per frame, and only when
//!   [`LayoutManager::is_settled`](crate::layout::LayoutManager::is_settled)
//!   is false.
//!
//! - **Applies results**: Implements [`LayoutHost`] to consume the
//!   [`LayoutChanges`] of each pass.
//!
//! # Frame loop pseudocode
//!
//! ```rust,ignore
//! fn on_frame(&mut self) {
//!     // Mutate: apply input, animations, content changes.
//!     self.tree.element_mut(label).set_text("Hello");
//!     self.tree.invalidate_measure(label);
//!
//!     // Lay out and hand the changes to the host.
//!     self.tree.execute_layout_pass()?;
//!     self.tree.present(&mut self.host);
//! }
//! ```

use crate::layout::{LayoutChanges, LayoutTree};

/// Applies layout changes to whatever presents the tree.
///
/// Implemented by platform integrations and test doubles alike.
pub trait LayoutHost<L> {
    /// Applies the given [`LayoutChanges`], reading current results from
    /// `tree` as needed.
    fn apply(&mut self, tree: &LayoutTree<L>, changes: &LayoutChanges);
}

impl<L> LayoutTree<L> {
    /// Drains pending changes and hands them to `host`.
    ///
    /// Equivalent to [`take_changes`](Self::take_changes) followed by
    /// [`LayoutHost::apply`]. Does nothing if nothing changed.
    pub fn present(&mut self, host: &mut impl LayoutHost<L>) {
        let changes = self.take_changes();
        if !changes.is_empty() {
            host.apply(self, &changes);
        }
    }
}
