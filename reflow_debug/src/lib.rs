// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for reflow layout
//! diagnostics.
//!
//! This crate provides [`TraceSink`](reflow_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output,
//!   plus [`pretty::write_tree`] for dumping a tree's layout state.
//! - [`recorder::RecorderSink`]: in-memory event log.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   events.

pub mod chrome;
pub mod pretty;
pub mod recorder;

#[cfg(test)]
pub(crate) mod testing;
