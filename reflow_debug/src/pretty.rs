// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).
//! [`write_tree`] dumps the current layout state of a whole tree.

use std::io::{self, Write};

use kurbo::{Rect, Size};
use reflow_core::layout::{LayoutTree, NodeId};
use reflow_core::trace::{
    ArrangeEvent, DiscardEvent, DiscardReason, MeasureEvent, PassBeginEvent, PassEndEvent,
    PassKind, PassOutcome, QueueKind, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(crate) fn fmt_size(s: Size) -> String {
    format!("{}x{}", s.width, s.height)
}

pub(crate) fn fmt_rect(r: Rect) -> String {
    format!("({}, {})-({}, {})", r.x0, r.y0, r.x1, r.y1)
}

fn kind_name(kind: PassKind) -> &'static str {
    match kind {
        PassKind::Initial => "initial",
        PassKind::Incremental => "incremental",
    }
}

pub(crate) fn queue_name(queue: QueueKind) -> &'static str {
    match queue {
        QueueKind::Measure => "measure",
        QueueKind::Arrange => "arrange",
    }
}

pub(crate) fn reason_name(reason: DiscardReason) -> &'static str {
    match reason {
        DiscardReason::Detached => "detached",
        DiscardReason::AlreadyValid => "already-valid",
    }
}

fn origin(queued: bool) -> &'static str {
    if queued { "queued" } else { "direct" }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] pass={} {} pending measure={} arrange={}",
            e.pass_index,
            kind_name(e.kind),
            e.pending_measure,
            e.pending_arrange,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let outcome = match e.outcome {
            PassOutcome::Settled => "settled",
            PassOutcome::Failed => "FAILED",
        };
        let s = &e.stats;
        let _ = writeln!(
            self.writer,
            "[pass:end] pass={} {outcome} iterations={} measured={} arranged={} discarded={}",
            s.pass_index, s.iterations, s.measured, s.arranged, s.discarded,
        );
    }

    fn on_measure(&mut self, e: &MeasureEvent) {
        let _ = writeln!(
            self.writer,
            "[measure] pass={} {:?} depth={} available={} desired={} ({})",
            e.pass_index,
            e.node,
            e.depth,
            fmt_size(e.available),
            fmt_size(e.desired),
            origin(e.queued),
        );
    }

    fn on_arrange(&mut self, e: &ArrangeEvent) {
        let _ = writeln!(
            self.writer,
            "[arrange] pass={} {:?} depth={} rect={} ({})",
            e.pass_index,
            e.node,
            e.depth,
            fmt_rect(e.rect),
            origin(e.queued),
        );
    }

    fn on_discard(&mut self, e: &DiscardEvent) {
        let _ = writeln!(
            self.writer,
            "[discard] pass={} {:?} {} {}",
            e.pass_index,
            e.node,
            queue_name(e.queue),
            reason_name(e.reason),
        );
    }
}

/// Writes the attached tree, one node per line, indented by depth.
///
/// Each line shows the node, its desired size and bounds, and which of its
/// measure and arrange are pending. Writes nothing if the tree has no root.
pub fn write_tree<L>(tree: &LayoutTree<L>, writer: &mut dyn Write) -> io::Result<()> {
    let Some(root) = tree.root() else {
        return Ok(());
    };
    let mut stack: Vec<NodeId> = vec![root];
    while let Some(node) = stack.pop() {
        let indent = "  ".repeat(tree.depth(node) as usize);
        let desired = tree.desired_size(node).map_or("-".into(), fmt_size);
        let bounds = tree.bounds(node).map_or("-".into(), fmt_rect);
        write!(writer, "{indent}{node:?} desired={desired} bounds={bounds}")?;
        if !tree.is_measure_valid(node) {
            write!(writer, " [measure pending]")?;
        }
        if !tree.is_arrange_valid(node) {
            write!(writer, " [arrange pending]")?;
        }
        writeln!(writer)?;

        let children: Vec<NodeId> = tree.children(node).collect();
        stack.extend(children.into_iter().rev());
    }
    Ok(())
}
