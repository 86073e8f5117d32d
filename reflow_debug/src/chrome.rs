// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads events recorded by a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Layout events carry no wall-clock time, so timestamps are logical: each
//! event is one microsecond after the previous one. Passes become duration
//! slices on thread 0; per-node events are instants on the thread matching
//! the node's depth, so a pass reads top to bottom like the tree.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use reflow_core::trace::{PassKind, PassOutcome};

use crate::pretty::{fmt_rect, fmt_size, queue_name, reason_name};
use crate::recorder::RecordedEvent;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let mut out: Vec<Value> = Vec::with_capacity(events.len());

    for (ts, recorded) in events.iter().enumerate() {
        match recorded {
            RecordedEvent::PassBegin(e) => {
                let kind = match e.kind {
                    PassKind::Initial => "Initial",
                    PassKind::Incremental => "Incremental",
                };
                out.push(json!({
                    "ph": "B",
                    "name": "LayoutPass",
                    "cat": "Pass",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "pass_index": e.pass_index,
                        "kind": kind,
                        "pending_measure": e.pending_measure,
                        "pending_arrange": e.pending_arrange,
                    }
                }));
            }
            RecordedEvent::PassEnd(e) => {
                let outcome = match e.outcome {
                    PassOutcome::Settled => "Settled",
                    PassOutcome::Failed => "Failed",
                };
                out.push(json!({
                    "ph": "E",
                    "name": "LayoutPass",
                    "cat": "Pass",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "pass_index": e.stats.pass_index,
                        "outcome": outcome,
                        "iterations": e.stats.iterations,
                        "measured": e.stats.measured,
                        "arranged": e.stats.arranged,
                        "discarded": e.stats.discarded,
                    }
                }));
            }
            RecordedEvent::Measure(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Measure",
                    "cat": "Node",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.depth + 1,
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "node": format!("{:?}", e.node),
                        "available": fmt_size(e.available),
                        "desired": fmt_size(e.desired),
                        "queued": e.queued,
                    }
                }));
            }
            RecordedEvent::Arrange(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Arrange",
                    "cat": "Node",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.depth + 1,
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "node": format!("{:?}", e.node),
                        "rect": fmt_rect(e.rect),
                        "queued": e.queued,
                    }
                }));
            }
            RecordedEvent::Discard(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Discard",
                    "cat": "Queue",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "node": format!("{:?}", e.node),
                        "queue": queue_name(e.queue),
                        "reason": reason_name(e.reason),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}
