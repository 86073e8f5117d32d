// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for layout passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! layout manager calls as a pass runs. All method bodies default to no-ops,
//! so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Pass it to [`execute_layout_pass_traced`] or
//! [`execute_initial_layout_pass_traced`].
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates the per-node [`MeasureEvent`],
//!   [`ArrangeEvent`], and [`DiscardEvent`] plus the corresponding
//!   `TraceSink` methods.
//!
//! [`execute_layout_pass_traced`]: crate::layout::LayoutTree::execute_layout_pass_traced
//! [`execute_initial_layout_pass_traced`]: crate::layout::LayoutTree::execute_initial_layout_pass_traced

#[cfg(feature = "trace-rich")]
use kurbo::{Rect, Size};

use crate::layout::PassStats;
#[cfg(feature = "trace-rich")]
use crate::layout::NodeId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which entry point started a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// [`execute_initial_layout_pass`](crate::layout::LayoutTree::execute_initial_layout_pass).
    Initial,
    /// [`execute_layout_pass`](crate::layout::LayoutTree::execute_layout_pass).
    Incremental,
}

/// One of the two work queues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Pending measure.
    Measure,
    /// Pending arrange.
    Arrange,
}

/// Why a queue entry was dropped without a callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// The node left the attached tree after it was queued.
    Detached,
    /// The node was already laid out, typically by its parent's callback.
    AlreadyValid,
}

/// How a pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassOutcome {
    /// Both queues drained.
    Settled,
    /// The pass returned an error.
    Failed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a pass starts, after the reentrancy check.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter for the tree.
    pub pass_index: u64,
    /// Entry point.
    pub kind: PassKind,
    /// Entries in the measure queue at the start.
    pub pending_measure: usize,
    /// Entries in the arrange queue at the start.
    pub pending_arrange: usize,
}

/// Emitted when a pass ends, whether it settled or failed.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Counters for the pass.
    pub stats: PassStats,
    /// How it ended.
    pub outcome: PassOutcome,
}

/// A completed measure callback.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct MeasureEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The measured node.
    pub node: NodeId,
    /// Its depth in the attached tree.
    pub depth: u32,
    /// Constraint it was measured with.
    pub available: Size,
    /// Size it asked for.
    pub desired: Size,
    /// `true` if the manager popped it from the queue, `false` if a parent's
    /// callback measured it.
    pub queued: bool,
}

/// A completed arrange callback.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct ArrangeEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The arranged node.
    pub node: NodeId,
    /// Its depth in the attached tree.
    pub depth: u32,
    /// Rectangle it was arranged in.
    pub rect: Rect,
    /// `true` if the manager popped it from the queue.
    pub queued: bool,
}

/// A queue entry dropped without a callback.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct DiscardEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The node.
    pub node: NodeId,
    /// Queue it was popped from.
    pub queue: QueueKind,
    /// Why nothing was done.
    pub reason: DiscardReason,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from layout passes.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a pass ends.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called after each successful measure callback (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_measure(&mut self, e: &MeasureEvent) {
        _ = e;
    }

    /// Called after each successful arrange callback (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_arrange(&mut self, e: &ArrangeEvent) {
        _ = e;
    }

    /// Called for each dropped queue entry (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_discard(&mut self, e: &DiscardEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`MeasureEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn measure(&mut self, e: &MeasureEvent) {
        if let Some(s) = &mut self.sink {
            s.on_measure(e);
        }
    }

    /// Emits an [`ArrangeEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn arrange(&mut self, e: &ArrangeEvent) {
        if let Some(s) = &mut self.sink {
            s.on_arrange(e);
        }
    }

    /// Emits a [`DiscardEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn discard(&mut self, e: &DiscardEvent) {
        if let Some(s) = &mut self.sink {
            s.on_discard(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
