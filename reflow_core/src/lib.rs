// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental layout scheduling for retained element trees.
//!
//! `reflow_core` decides *when* each element of a tree is measured and
//! arranged, and with which constraint. The elements themselves decide *how*:
//! they implement [`Layoutable`](layout::Layoutable). It is `no_std`
//! compatible (with `alloc`) and uses array-based struct-of-arrays storage
//! with index handles.
//!
//! # Architecture
//!
//! Mutations feed two depth-ordered queues; a pass drains them to a fixed
//! point and hands the results to the host:
//!
//! ```text
//!   invalidate_measure / invalidate_arrange / add_child / set_root_width
//!       │
//!       ▼
//!   InvalidationQueue (measure) + InvalidationQueue (arrange)
//!       │
//!       ▼
//!   LayoutTree::execute_layout_pass() ──► Layoutable::measure / arrange
//!       │                                        │
//!       │          ┌─────────────────────────────┘
//!       │          ▼
//!       │    LayoutCx::measure_child / arrange_child / invalidate_*
//!       ▼
//!   LayoutTree::take_changes() ──► LayoutChanges ──► LayoutHost::apply()
//! ```
//!
//! **[`layout`]**: Struct-of-arrays node tree with generational handles,
//! the element contract, invalidation queues, and the layout manager.
//!
//! **[`root`]**: Root constraints: how the root's available size and final
//! rectangle are derived from explicit sizes and the client area.
//!
//! **[`dirty`]**: Change channels via `understory_dirty`. Layout records
//! which desired sizes and bounds actually changed; hosts drain them.
//!
//! **[`host`]**: The [`LayoutHost`](host::LayoutHost) trait that consumers
//! implement to apply layout changes.
//!
//! **[`error`]**: [`LayoutError`](error::LayoutError), returned by passes.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! pass instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-node
//!   measure, arrange, and discard events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod error;
pub mod host;
pub mod layout;
pub mod root;
pub mod trace;
