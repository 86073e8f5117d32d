// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-ordered work sets for pending measure and arrange.
//!
//! An [`InvalidationQueue`] holds each node at most once, keyed by the depth
//! it had when it was enqueued. [`pop_shallowest`](InvalidationQueue::pop_shallowest)
//! always yields the entry closest to the root, so an ancestor's callback
//! gets the chance to lay out (and thereby satisfy) queued descendants before
//! they are popped on their own.
//!
//! Entries at the same depth pop in insertion order. The queue itself knows
//! nothing about attachment or validity; the [layout manager](super::manager)
//! filters both when it pops.

use alloc::collections::{BTreeMap, BTreeSet};

use super::id::NodeId;

/// Membership record for a queued slot.
#[derive(Clone, Copy, Debug)]
struct Entry {
    depth: u32,
    seq: u64,
    generation: u32,
}

/// An ordered, duplicate-free set of nodes awaiting layout work.
#[derive(Clone, Debug, Default)]
pub struct InvalidationQueue {
    /// `(depth, seq, slot)`, smallest first.
    order: BTreeSet<(u32, u64, u32)>,
    entries: BTreeMap<u32, Entry>,
    next_seq: u64,
}

impl InvalidationQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            order: BTreeSet::new(),
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Returns the number of queued nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no node is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether `id` is currently queued.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries
            .get(&id.idx)
            .is_some_and(|e| e.generation == id.generation)
    }

    /// Adds `id` at `depth`.
    ///
    /// Returns `false` (and leaves the existing entry, including its depth
    /// and position, untouched) if the node is already queued.
    pub fn enqueue(&mut self, id: NodeId, depth: u32) -> bool {
        if let Some(existing) = self.entries.get(&id.idx) {
            if existing.generation == id.generation {
                return false;
            }
            // Leftover from a destroyed node that reused this slot.
            let existing = *existing;
            self.order.remove(&(existing.depth, existing.seq, id.idx));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert((depth, seq, id.idx));
        self.entries.insert(
            id.idx,
            Entry {
                depth,
                seq,
                generation: id.generation,
            },
        );
        true
    }

    /// Removes `id` from the queue. Returns whether it was present.
    pub fn remove(&mut self, id: NodeId) -> bool {
        match self.entries.get(&id.idx) {
            Some(e) if e.generation == id.generation => {
                let e = *e;
                self.entries.remove(&id.idx);
                self.order.remove(&(e.depth, e.seq, id.idx));
                true
            }
            _ => false,
        }
    }

    /// Returns the shallowest queued node and the depth it was queued at,
    /// without removing it.
    #[must_use]
    pub fn peek_shallowest(&self) -> Option<(NodeId, u32)> {
        let &(depth, _, idx) = self.order.first()?;
        let entry = self.entries.get(&idx)?;
        Some((
            NodeId {
                idx,
                generation: entry.generation,
            },
            depth,
        ))
    }

    /// Removes and returns the shallowest queued node and the depth it was
    /// queued at.
    pub fn pop_shallowest(&mut self) -> Option<(NodeId, u32)> {
        let (depth, _, idx) = self.order.pop_first()?;
        let entry = self.entries.remove(&idx)?;
        Some((
            NodeId {
                idx,
                generation: entry.generation,
            },
            depth,
        ))
    }

    /// Iterates over queued nodes in pop order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().filter_map(|&(_, _, idx)| {
            self.entries.get(&idx).map(|e| NodeId {
                idx,
                generation: e.generation,
            })
        })
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}
