// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for layout change reporting.
//!
//! Layout results are recorded through [`understory_dirty`] so that a host
//! can find out what moved or resized since it last looked, without scanning
//! the whole tree. All channels are local-only: a node is reported when its
//! own result changed, never because an ancestor's did.
//!
//! These channels are unrelated to measure/arrange validity. Validity decides
//! what the [layout manager](crate::layout::LayoutManager) must recompute; the
//! channels record what a recomputation actually changed.
//!
//! # Consumption
//!
//! [`LayoutTree::take_changes`](crate::layout::LayoutTree::take_changes)
//! drains every channel and surfaces the results as
//! [`LayoutChanges`](crate::layout::LayoutChanges).

use understory_dirty::Channel;

/// A measure produced a different desired size.
pub const DESIRED_SIZE: Channel = Channel::new(0);

/// An arrange placed the node at a different rectangle.
pub const BOUNDS: Channel = Channel::new(1);

/// Tree topology changed (create, destroy, attach or detach).
pub const TOPOLOGY: Channel = Channel::new(2);
