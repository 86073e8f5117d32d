// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event it
//! receives, in order, as a [`RecordedEvent`]. Recordings feed
//! [`chrome::export`](crate::chrome::export) or direct assertions in tests.

use reflow_core::layout::NodeId;
use reflow_core::trace::{
    ArrangeEvent, DiscardEvent, MeasureEvent, PassBeginEvent, PassEndEvent, TraceSink,
};

/// A recorded trace event.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// A [`MeasureEvent`].
    Measure(MeasureEvent),
    /// An [`ArrangeEvent`].
    Arrange(ArrangeEvent),
    /// A [`DiscardEvent`].
    Discard(DiscardEvent),
}

impl RecordedEvent {
    /// The pass the event belongs to.
    #[must_use]
    pub fn pass_index(&self) -> u64 {
        match self {
            Self::PassBegin(e) => e.pass_index,
            Self::PassEnd(e) => e.stats.pass_index,
            Self::Measure(e) => e.pass_index,
            Self::Arrange(e) => e.pass_index,
            Self::Discard(e) => e.pass_index,
        }
    }

    /// The node a per-node event is about.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::PassBegin(_) | Self::PassEnd(_) => None,
            Self::Measure(e) => Some(e.node),
            Self::Arrange(e) => Some(e.node),
            Self::Discard(e) => Some(e.node),
        }
    }
}

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Forgets everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Nodes measured in pass `pass_index`, in callback completion order.
    ///
    /// Children measured by their parent's callback complete before the
    /// parent does, so they come first.
    #[must_use]
    pub fn measured_in(&self, pass_index: u64) -> Vec<NodeId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Measure(m) if m.pass_index == pass_index => Some(m.node),
                _ => None,
            })
            .collect()
    }

    /// The end event of every recorded pass.
    pub fn pass_ends(&self) -> impl Iterator<Item = &PassEndEvent> + '_ {
        self.events.iter().filter_map(|e| match e {
            RecordedEvent::PassEnd(end) => Some(end),
            _ => None,
        })
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.events.push(RecordedEvent::PassBegin(*e));
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.events.push(RecordedEvent::PassEnd(*e));
    }

    fn on_measure(&mut self, e: &MeasureEvent) {
        self.events.push(RecordedEvent::Measure(*e));
    }

    fn on_arrange(&mut self, e: &ArrangeEvent) {
        self.events.push(RecordedEvent::Arrange(*e));
    }

    fn on_discard(&mut self, e: &DiscardEvent) {
        self.events.push(RecordedEvent::Discard(*e));
    }
}
