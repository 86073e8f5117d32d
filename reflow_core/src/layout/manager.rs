// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pass execution: draining the measure and arrange queues to a fixed point.
//!
//! Each loop iteration does one unit of measure work followed by one unit of
//! arrange work:
//!
//! 1. **Measure**: Pop the shallowest pending-measure node. Skip it if it is
//!    detached or already valid (an ancestor's callback measured it
//!    directly). Otherwise measure it with its previous constraint, or with
//!    the [root policy](crate::root) if it is the root.
//! 2. **Arrange**: Pop the shallowest pending-arrange node and filter it the
//!    same way. A node whose measure is still pending is put back and its
//!    measure is scheduled. Otherwise arrange it in its previous rectangle,
//!    or with the root policy.
//!
//! Callbacks may invalidate further nodes at any time, which simply feeds the
//! queues. The loop ends when a sweep finds both queues empty.
//!
//! Alternating rather than draining one queue first matters because an
//! arrange can invalidate a measure (a late-bound size) and vice versa.

use alloc::collections::BTreeMap;

use kurbo::{Point, Rect, Size};

use super::id::NodeId;
use super::layoutable::Layoutable;
use super::queue::InvalidationQueue;
use super::store::LayoutTree;
use crate::error::LayoutError;
use crate::root::{RootConstraints, UNBOUNDED};
use crate::trace::{
    DiscardReason, PassBeginEvent, PassEndEvent, PassKind, PassOutcome, QueueKind, Tracer,
};

/// What the manager is doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutPhase {
    /// No pass is running.
    #[default]
    Idle,
    /// A pass is running and is in its measure step.
    Measuring,
    /// A pass is running and is in its arrange step.
    Arranging,
}

/// Configuration for the layout manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutConfig {
    /// How many times the loop may process (measure or arrange) the same node
    /// within one pass before the pass is abandoned with
    /// [`LayoutError::Unsettled`].
    ///
    /// A settled tree touches each node a handful of times at most; hitting
    /// this limit means some callback keeps invalidating a node it depends
    /// on.
    pub max_node_visits: u32,
}

impl LayoutConfig {
    /// Default configuration.
    pub const DEFAULT: Self = Self {
        max_node_visits: 64,
    };

    /// Returns this configuration with a different visit limit.
    #[must_use]
    pub const fn with_max_node_visits(self, max_node_visits: u32) -> Self {
        Self { max_node_visits }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Counters for one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PassStats {
    /// Monotonic pass counter for this tree, starting at 1.
    pub pass_index: u64,
    /// Loop iterations (one measure step plus one arrange step each).
    pub iterations: u32,
    /// Measure callbacks invoked, including ones made by parents.
    pub measured: u32,
    /// Arrange callbacks invoked, including ones made by parents.
    pub arranged: u32,
    /// Queue entries dropped without a callback (detached or already valid).
    pub discarded: u32,
}

/// Scheduling state owned by each [`LayoutTree`].
///
/// There is no global "current pass": every tree carries its own manager,
/// so independent trees (one per window, say) never interfere.
#[derive(Debug, Default)]
pub struct LayoutManager {
    pub(crate) measure_queue: InvalidationQueue,
    pub(crate) arrange_queue: InvalidationQueue,
    pub(crate) phase: LayoutPhase,
    pub(crate) config: LayoutConfig,
    pub(crate) pass_index: u64,
    pub(crate) stats: PassStats,
    /// Per-slot processing count for the running pass.
    visits: BTreeMap<u32, u32>,
}

impl LayoutManager {
    pub(crate) fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    /// Number of passes started so far, including failed ones.
    #[must_use]
    pub fn passes_started(&self) -> u64 {
        self.pass_index
    }

    /// Statistics of the most recent pass.
    #[must_use]
    pub fn last_pass(&self) -> PassStats {
        self.stats
    }

    /// Returns `true` if no work is pending.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.measure_queue.is_empty() && self.arrange_queue.is_empty()
    }
}

impl<L: Layoutable> LayoutTree<L> {
    /// Installs `root` as the layout root and lays out the tree from scratch.
    ///
    /// The root is forced measure-invalid, measured against
    /// `constraints`' [available size](RootConstraints::available_size),
    /// arranged at its [arrange rect](RootConstraints::arrange_rect), and
    /// then every invalidation this produced is settled as in
    /// [`execute_layout_pass`](Self::execute_layout_pass).
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale or has a parent.
    pub fn execute_initial_layout_pass(
        &mut self,
        root: NodeId,
        constraints: RootConstraints,
    ) -> Result<PassStats, LayoutError<L::Error>> {
        self.execute_initial_layout_pass_traced(root, constraints, &mut Tracer::none())
    }

    /// Like [`execute_initial_layout_pass`](Self::execute_initial_layout_pass),
    /// reporting to `tracer`.
    pub fn execute_initial_layout_pass_traced(
        &mut self,
        root: NodeId,
        constraints: RootConstraints,
        tracer: &mut Tracer<'_>,
    ) -> Result<PassStats, LayoutError<L::Error>> {
        self.ensure_idle()?;
        self.validate(root);
        self.install_root(root.idx);
        self.root_constraints = constraints;

        let i = root.idx as usize;
        self.measure_valid[i] = false;
        self.arrange_valid[i] = false;
        // The root is the only node at depth 0, so the first iteration of the
        // loop measures it and then arranges it before anything else.
        self.schedule(root.idx, true, true);

        self.begin_pass(PassKind::Initial, tracer);
        let result = self.settle(tracer);
        self.end_pass(result, tracer)
    }

    /// Processes every pending measure and arrange until nothing is left.
    ///
    /// On error the tree is left consistent: the failing node stays invalid,
    /// everything still queued stays queued, and the manager returns to
    /// [`LayoutPhase::Idle`]. Retrying is a matter of invalidating the node
    /// and calling this again.
    pub fn execute_layout_pass(&mut self) -> Result<PassStats, LayoutError<L::Error>> {
        self.execute_layout_pass_traced(&mut Tracer::none())
    }

    /// Like [`execute_layout_pass`](Self::execute_layout_pass), reporting to
    /// `tracer`.
    pub fn execute_layout_pass_traced(
        &mut self,
        tracer: &mut Tracer<'_>,
    ) -> Result<PassStats, LayoutError<L::Error>> {
        self.ensure_idle()?;
        self.begin_pass(PassKind::Incremental, tracer);
        let result = self.settle(tracer);
        self.end_pass(result, tracer)
    }

    fn ensure_idle(&self) -> Result<(), LayoutError<L::Error>> {
        match self.manager.phase {
            LayoutPhase::Idle => Ok(()),
            phase => Err(LayoutError::ReentrantPass { phase }),
        }
    }

    fn begin_pass(&mut self, kind: PassKind, tracer: &mut Tracer<'_>) {
        self.manager.pass_index += 1;
        self.manager.stats = PassStats {
            pass_index: self.manager.pass_index,
            ..PassStats::default()
        };
        self.manager.visits.clear();
        tracer.pass_begin(&PassBeginEvent {
            pass_index: self.manager.pass_index,
            kind,
            pending_measure: self.manager.measure_queue.len(),
            pending_arrange: self.manager.arrange_queue.len(),
        });
    }

    fn end_pass(
        &mut self,
        result: Result<(), LayoutError<L::Error>>,
        tracer: &mut Tracer<'_>,
    ) -> Result<PassStats, LayoutError<L::Error>> {
        self.manager.phase = LayoutPhase::Idle;
        let stats = self.manager.stats;
        tracer.pass_end(&PassEndEvent {
            stats,
            outcome: if result.is_ok() {
                PassOutcome::Settled
            } else {
                PassOutcome::Failed
            },
        });
        result.map(|()| stats)
    }

    /// The fixed-point loop.
    fn settle(&mut self, tracer: &mut Tracer<'_>) -> Result<(), LayoutError<L::Error>> {
        while !self.manager.is_settled() {
            self.manager.stats.iterations += 1;

            self.manager.phase = LayoutPhase::Measuring;
            if let Some(idx) = self.next_pending(QueueKind::Measure, tracer) {
                self.visit(idx)?;
                self.measure_pending(idx, tracer)?;
            }

            self.manager.phase = LayoutPhase::Arranging;
            if let Some(idx) = self.next_pending(QueueKind::Arrange, tracer) {
                self.visit(idx)?;
                self.arrange_pending(idx, tracer)?;
            }
        }
        Ok(())
    }

    /// Pops entries until one needs work, discarding the rest.
    fn next_pending(&mut self, kind: QueueKind, tracer: &mut Tracer<'_>) -> Option<u32> {
        loop {
            let (id, queued_depth) = match kind {
                QueueKind::Measure => self.manager.measure_queue.pop_shallowest(),
                QueueKind::Arrange => self.manager.arrange_queue.pop_shallowest(),
            }?;
            let i = id.idx as usize;

            if !self.attached[i] {
                self.discard(id, kind, DiscardReason::Detached, tracer);
                continue;
            }
            let depth = self.depth[i];
            if depth != queued_depth {
                // Moved while queued; re-file under the current depth.
                self.queue_mut(kind).enqueue(id, depth);
                continue;
            }
            let valid = match kind {
                QueueKind::Measure => self.measure_valid[i],
                QueueKind::Arrange => self.arrange_valid[i],
            };
            if valid {
                self.discard(id, kind, DiscardReason::AlreadyValid, tracer);
                continue;
            }
            if kind == QueueKind::Arrange && !self.measure_valid[i] {
                // Measure first; the arrange stays queued.
                self.schedule(id.idx, true, true);
                return None;
            }
            return Some(id.idx);
        }
    }

    fn queue_mut(&mut self, kind: QueueKind) -> &mut InvalidationQueue {
        match kind {
            QueueKind::Measure => &mut self.manager.measure_queue,
            QueueKind::Arrange => &mut self.manager.arrange_queue,
        }
    }

    fn discard(
        &mut self,
        id: NodeId,
        kind: QueueKind,
        reason: DiscardReason,
        tracer: &mut Tracer<'_>,
    ) {
        self.manager.stats.discarded += 1;
        #[cfg(feature = "trace-rich")]
        tracer.discard(&crate::trace::DiscardEvent {
            pass_index: self.manager.pass_index,
            node: id,
            queue: kind,
            reason,
        });
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = (id, kind, reason, tracer);
        }
    }

    /// Counts one more processing of `idx` and fails once it exceeds the
    /// configured limit.
    fn visit(&mut self, idx: u32) -> Result<(), LayoutError<L::Error>> {
        let node = self.id_at(idx);
        let limit = self.manager.config.max_node_visits;
        let visits = self.manager.visits.entry(idx).or_insert(0);
        *visits += 1;
        if *visits > limit {
            return Err(LayoutError::Unsettled {
                node,
                visits: *visits,
            });
        }
        Ok(())
    }

    fn measure_pending(
        &mut self,
        idx: u32,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), LayoutError<L::Error>> {
        let node = self.id_at(idx);
        let i = idx as usize;
        let available = if idx == self.root {
            self.root_constraints.available_size()
        } else {
            self.previous_measure[i].unwrap_or(UNBOUNDED)
        };
        let before = self.desired_size[i];
        let desired = self
            .measure_node(idx, available, true, tracer)
            .map_err(|source| LayoutError::Measure { node, source })?;

        // A changed desired size is news to a parent that thinks it is done.
        if before.is_some_and(|b| b != desired) {
            if let Some(p) = self.parent_slot(idx) {
                if self.measure_valid[p as usize] {
                    self.invalidate_measure_at(p);
                }
            }
        }
        Ok(())
    }

    fn arrange_pending(
        &mut self,
        idx: u32,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), LayoutError<L::Error>> {
        let node = self.id_at(idx);
        let i = idx as usize;
        let desired = self.desired_size[i].unwrap_or(Size::ZERO);
        let rect = if idx == self.root {
            self.root_constraints.arrange_rect(desired)
        } else {
            // A node its parent never placed goes at the origin.
            self.previous_arrange[i]
                .unwrap_or_else(|| Rect::from_origin_size(Point::ORIGIN, desired))
        };
        self.arrange_node(idx, rect, true, tracer)
            .map_err(|source| LayoutError::Arrange { node, source })
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::{Rect, Size};

    use super::*;
    use crate::layout::fixtures::{Call, Invalidate, Probe, ProbeFailure, ProbeLayout, ProbeLog};

    type Tree = LayoutTree<Probe>;

    /// `root -> a -> b`, all logging into one shared log.
    fn chain(layout: ProbeLayout) -> (Tree, ProbeLog, NodeId, NodeId, NodeId) {
        let log = ProbeLog::default();
        let mut tree = Tree::new();
        let root = tree.create_node(Probe::leaf("root", 10.0, 10.0).layout(layout).log(&log));
        let a = tree.create_node(Probe::leaf("a", 10.0, 10.0).layout(layout).log(&log));
        let b = tree.create_node(Probe::leaf("b", 10.0, 10.0).layout(layout).log(&log));
        tree.add_child(root, a);
        tree.add_child(a, b);
        (tree, log, root, a, b)
    }

    fn reset_counts(tree: &mut Tree, nodes: &[NodeId]) {
        for &n in nodes {
            let p = tree.element_mut(n);
            p.measured = 0;
            p.arranged = 0;
        }
    }

    #[test]
    fn measures_and_arranges_invalidated_control() {
        let (mut tree, _log, root, _a, b) = chain(ProbeLayout::Stack);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();
        reset_counts(&mut tree, &[b]);

        tree.invalidate_measure(b);
        tree.execute_layout_pass().unwrap();

        assert_eq!(tree.element(b).measured, 1);
        assert_eq!(tree.element(b).arranged, 1);
        assert!(tree.is_measure_valid(b));
        assert!(tree.is_arrange_valid(b));
    }

    #[test]
    fn arrange_invalidation_does_not_remeasure() {
        let (mut tree, _log, root, a, b) = chain(ProbeLayout::Stack);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();
        reset_counts(&mut tree, &[root, a, b]);

        tree.invalidate_arrange(b);
        assert!(tree.is_measure_valid(b));
        assert!(tree.is_measure_valid(a));
        assert!(tree.is_measure_valid(root));
        tree.execute_layout_pass().unwrap();

        assert_eq!(tree.element(b).measured, 0);
        assert_eq!(tree.element(b).arranged, 1);
        assert_eq!(tree.element(a).arranged, 0, "arrange does not propagate");
        assert!(tree.is_arrange_valid(b));
    }

    #[test]
    fn measures_parent_of_newly_added_control() {
        let log = ProbeLog::default();
        let mut tree = Tree::new();
        let root = tree.create_node(Probe::leaf("root", 0.0, 0.0).log(&log));
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        let child = tree.create_node(Probe::leaf("child", 10.0, 10.0).log(&log));
        tree.add_child(root, child);
        reset_counts(&mut tree, &[root]);
        tree.execute_layout_pass().unwrap();

        assert_eq!(tree.element(root).measured, 1);
        assert_eq!(tree.element(root).arranged, 1);
        assert_eq!(tree.element(child).measured, 1);
        assert_eq!(tree.element(child).arranged, 1);
        assert_eq!(tree.desired_size(root), Some(Size::new(10.0, 10.0)));
    }

    #[test]
    fn measures_in_depth_order() {
        let (mut tree, log, root, a, b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.invalidate_measure(b);
        tree.invalidate_measure(a);
        tree.invalidate_measure(root);
        log.clear();
        tree.execute_layout_pass().unwrap();

        assert_eq!(log.measures(), vec!["root", "a", "b"]);
    }

    #[test]
    fn invalidating_root_and_grandchild_also_remeasures_the_middle() {
        let (mut tree, log, root, _a, b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.invalidate_measure(b);
        tree.invalidate_measure(root);
        log.clear();
        tree.execute_layout_pass().unwrap();

        // `b`'s invalidation propagated through `a`.
        assert_eq!(log.measures(), vec!["root", "a", "b"]);
    }

    #[test]
    fn parent_measuring_child_directly_satisfies_queued_child() {
        let (mut tree, log, root, a, b) = chain(ProbeLayout::Stack);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.invalidate_measure(b);
        log.clear();
        let stats = tree.execute_layout_pass().unwrap();

        assert_eq!(log.measures(), vec!["root", "a", "b"]);
        assert_eq!(stats.measured, 3);
        assert!(stats.discarded >= 2, "queued `a` and `b` were already valid");
        for n in [root, a, b] {
            assert!(tree.is_measure_valid(n));
            assert!(tree.is_arrange_valid(n));
        }
        assert!(tree.manager().is_settled());
    }

    #[test]
    fn removed_control_is_never_laid_out() {
        let (mut tree, _log, root, a, b) = chain(ProbeLayout::Stack);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();
        reset_counts(&mut tree, &[a, b]);

        tree.invalidate_measure(b);
        tree.remove_from_parent(a);
        tree.execute_layout_pass().unwrap();

        assert_eq!(tree.element(a).measured, 0);
        assert_eq!(tree.element(b).measured, 0);
        assert_eq!(tree.element(b).arranged, 0);
        assert!(!tree.is_measure_valid(b));
        assert!(tree.manager().is_settled());
    }

    #[test]
    fn unconstrained_root_is_measured_with_infinity() {
        let mut tree = Tree::new();
        let root = tree.create_node(Probe::leaf("root", 100.0, 100.0));
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();
        assert_eq!(tree.element(root).last_available, Some(UNBOUNDED));
    }

    #[test]
    fn root_ignores_client_bounds_when_measuring() {
        let mut tree = Tree::new();
        let root = tree.create_node(Probe::leaf("root", 200.0, 100.0));
        let constraints =
            RootConstraints::UNCONSTRAINED.with_max_client_size(Size::new(123.0, 456.0));
        tree.execute_initial_layout_pass(root, constraints).unwrap();

        assert_eq!(tree.element(root).last_available, Some(UNBOUNDED));
        // The client bounds still clip the placement.
        assert_eq!(
            tree.element(root).last_rect,
            Some(Rect::new(0.0, 0.0, 123.0, 100.0))
        );
    }

    #[test]
    fn root_arrange_follows_explicit_width() {
        let log = ProbeLog::default();
        let mut tree = Tree::new();
        let root = tree.create_node(
            Probe::leaf("root", 0.0, 40.0)
                .layout(ProbeLayout::Overlay)
                .log(&log),
        );
        let left = tree.create_node(Probe::leaf("left", 30.0, 20.0).log(&log));
        let right = tree.create_node(Probe::leaf("right", 30.0, 20.0).log(&log));
        tree.add_child(root, left);
        tree.add_child(root, right);

        let constraints = RootConstraints::UNCONSTRAINED.with_width(100.0);
        tree.execute_initial_layout_pass(root, constraints).unwrap();
        let height = tree.desired_size(root).unwrap().height;
        assert_eq!(tree.element(root).last_rect.unwrap().size(), Size::new(100.0, height));

        reset_counts(&mut tree, &[left, right]);
        tree.set_root_width(Some(120.0));
        tree.execute_layout_pass().unwrap();

        assert_eq!(
            tree.element(root).last_rect.unwrap().size(),
            Size::new(120.0, height)
        );
        assert_eq!(tree.element(left).measured, 0, "siblings keep their measure");
        assert_eq!(tree.element(right).measured, 0, "siblings keep their measure");
    }

    #[test]
    fn explicit_root_size_applies_to_arrange() {
        let mut tree = Tree::new();
        let root = tree.create_node(Probe::leaf("root", 0.0, 0.0));
        let constraints = RootConstraints::UNCONSTRAINED
            .with_width(100.0)
            .with_height(100.0);
        tree.execute_initial_layout_pass(root, constraints).unwrap();
        assert_eq!(
            tree.element(root).last_rect,
            Some(Rect::new(0.0, 0.0, 100.0, 100.0))
        );

        tree.set_root_width(Some(120.0));
        tree.execute_layout_pass().unwrap();
        assert_eq!(
            tree.element(root).last_rect,
            Some(Rect::new(0.0, 0.0, 120.0, 100.0))
        );
    }

    #[test]
    fn initial_pass_on_unconstrained_root_with_child() {
        let mut tree = Tree::new();
        let root = tree.create_node(Probe::leaf("root", 0.0, 0.0));
        let child = tree.create_node(Probe::leaf("child", 10.0, 10.0));
        tree.add_child(root, child);

        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        assert_eq!(tree.desired_size(root), Some(Size::new(10.0, 10.0)));
        assert!(tree.is_arrange_valid(child));
        assert_eq!(tree.bounds(child), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn invalidating_child_remeasures_parent() {
        let mut tree = Tree::new();
        let root = tree.create_node(Probe::leaf("root", 0.0, 0.0));
        let panel = tree.create_node(Probe::leaf("panel", 0.0, 0.0));
        let border = tree.create_node(Probe::leaf("border", 0.0, 0.0));
        tree.add_child(root, panel);
        tree.add_child(panel, border);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();
        assert_eq!(tree.desired_size(root), Some(Size::ZERO));

        tree.element_mut(border).size = Size::new(100.0, 100.0);
        tree.invalidate_measure(border);
        tree.execute_layout_pass().unwrap();

        assert_eq!(tree.desired_size(panel), Some(Size::new(100.0, 100.0)));
        assert_eq!(tree.desired_size(root), Some(Size::new(100.0, 100.0)));
    }

    #[test]
    fn queued_child_size_change_remeasures_valid_parent() {
        let (mut tree, log, root, a, b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        // `a` is invalidated first, so `b`'s invalidation stops there. `a`
        // does not measure its children, so it is valid again by the time the
        // queue reaches `b`, whose new size must send `a` round once more.
        tree.invalidate_measure(a);
        tree.element_mut(b).size = Size::new(99.0, 99.0);
        tree.invalidate_measure(b);
        log.clear();
        tree.execute_layout_pass().unwrap();

        assert_eq!(log.measures(), vec!["root", "a", "b", "root", "a"]);
        assert!(tree.manager().is_settled());
    }

    #[test]
    fn repeated_passes_are_idempotent() {
        let (mut tree, _log, root, a, b) = chain(ProbeLayout::Stack);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.invalidate_measure(b);
        tree.execute_layout_pass().unwrap();
        let first: Vec<_> = [root, a, b].iter().map(|&n| tree.desired_size(n)).collect();

        reset_counts(&mut tree, &[root, a, b]);
        let stats = tree.execute_layout_pass().unwrap();
        let second: Vec<_> = [root, a, b].iter().map(|&n| tree.desired_size(n)).collect();

        assert_eq!(first, second);
        assert_eq!(stats.iterations, 0);
        assert_eq!(tree.element(root).measured, 0);
    }

    #[test]
    fn measure_failure_propagates_and_leaves_node_invalid() {
        let (mut tree, _log, root, a, b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.element_mut(b).fail_measure = true;
        tree.invalidate_measure(b);
        let err = tree.execute_layout_pass().unwrap_err();

        assert!(matches!(
            err,
            LayoutError::Measure { node, source: ProbeFailure("b") } if node == b
        ));
        assert!(!tree.is_measure_valid(b));
        assert!(tree.is_measure_valid(a));
        assert!(!tree.pending_measure().contains(b), "failing node is not re-queued");
        assert_eq!(tree.phase(), LayoutPhase::Idle);

        // Caller-driven retry.
        tree.element_mut(b).fail_measure = false;
        tree.invalidate_measure(b);
        tree.execute_layout_pass().unwrap();
        assert!(tree.is_measure_valid(b));
        assert!(tree.is_arrange_valid(b));
    }

    #[test]
    fn arrange_failure_propagates_and_leaves_node_invalid() {
        let (mut tree, _log, root, _a, b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.element_mut(b).fail_arrange = true;
        tree.invalidate_arrange(b);
        let err = tree.execute_layout_pass().unwrap_err();

        assert_eq!(err.node(), Some(b));
        assert!(matches!(err, LayoutError::Arrange { .. }));
        assert!(!tree.is_arrange_valid(b));
        assert_eq!(tree.phase(), LayoutPhase::Idle);
    }

    #[test]
    fn pass_while_running_is_rejected() {
        let (mut tree, _log, root, _a, _b) = chain(ProbeLayout::Stack);
        tree.manager.phase = LayoutPhase::Measuring;

        let err = tree
            .execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap_err();
        assert!(matches!(
            err,
            LayoutError::ReentrantPass {
                phase: LayoutPhase::Measuring
            }
        ));
        assert!(matches!(
            tree.execute_layout_pass(),
            Err(LayoutError::ReentrantPass { .. })
        ));
        assert_eq!(tree.manager().passes_started(), 0);
    }

    #[test]
    fn endless_invalidation_is_reported() {
        let (mut tree, _log, root, a, b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        // Two nodes that keep knocking each other's arrange out.
        tree.element_mut(a).on_arrange = Some((b, Invalidate::Arrange));
        tree.element_mut(b).on_arrange = Some((a, Invalidate::Arrange));
        tree.invalidate_arrange(a);
        let err = tree.execute_layout_pass().unwrap_err();

        match err {
            LayoutError::Unsettled { node, visits } => {
                assert_eq!(node, a);
                assert_eq!(visits, LayoutConfig::DEFAULT.max_node_visits + 1);
            }
            other => panic!("expected Unsettled, got {other:?}"),
        }
        assert_eq!(tree.phase(), LayoutPhase::Idle);
    }

    #[test]
    fn visit_limit_is_configurable() {
        let log = ProbeLog::default();
        let mut tree = Tree::with_config(LayoutConfig::DEFAULT.with_max_node_visits(3));
        let root = tree.create_node(Probe::leaf("root", 0.0, 0.0).log(&log));
        let a = tree.create_node(Probe::leaf("a", 0.0, 0.0).layout(ProbeLayout::Opaque));
        let b = tree.create_node(Probe::leaf("b", 0.0, 0.0).layout(ProbeLayout::Opaque));
        tree.add_child(root, a);
        tree.add_child(root, b);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.element_mut(a).on_arrange = Some((b, Invalidate::Arrange));
        tree.element_mut(b).on_arrange = Some((a, Invalidate::Arrange));
        tree.invalidate_arrange(b);
        let err = tree.execute_layout_pass().unwrap_err();
        assert!(matches!(err, LayoutError::Unsettled { node, visits: 4 } if node == b));
    }

    #[test]
    fn arrange_can_invalidate_measure_mid_pass() {
        let (mut tree, log, root, a, b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.element_mut(a).on_arrange = Some((b, Invalidate::Measure));
        tree.invalidate_arrange(a);
        log.clear();
        tree.execute_layout_pass().unwrap();

        assert!(log.calls().contains(&("b", Call::Measure)));
        for n in [root, a, b] {
            assert!(tree.is_measure_valid(n));
        }
        assert!(tree.manager().is_settled());
    }

    #[test]
    fn arrange_invalidating_own_measure_is_kept() {
        let (mut tree, log, root, a, _b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.element_mut(a).on_arrange_once = Some((a, Invalidate::Measure));
        tree.invalidate_arrange(a);
        log.clear();
        tree.execute_layout_pass().unwrap();

        assert_eq!(
            log.calls(),
            vec![
                ("a", Call::Arrange),
                ("root", Call::Measure),
                ("root", Call::Arrange),
                ("a", Call::Measure),
                ("a", Call::Arrange),
            ]
        );
        assert!(tree.is_measure_valid(a));
        assert!(tree.is_arrange_valid(a));
        assert!(tree.manager().is_settled());
    }

    #[test]
    fn arrange_invalidating_itself_is_arranged_again() {
        let (mut tree, log, root, a, _b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.element_mut(a).on_arrange_once = Some((a, Invalidate::Arrange));
        tree.invalidate_arrange(a);
        log.clear();
        tree.execute_layout_pass().unwrap();

        assert_eq!(log.calls(), vec![("a", Call::Arrange), ("a", Call::Arrange)]);
        assert!(tree.is_arrange_valid(a));
        assert!(tree.manager().is_settled());
    }

    #[test]
    fn measure_invalidating_itself_is_measured_again() {
        let (mut tree, log, root, a, _b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        tree.element_mut(a).on_measure_once = Some((a, Invalidate::Measure));
        tree.invalidate_measure(a);
        log.clear();
        tree.execute_layout_pass().unwrap();

        // The invalidation reaches `root` again, whose arrange then waits for
        // its measure.
        assert_eq!(
            log.calls(),
            vec![
                ("root", Call::Measure),
                ("root", Call::Arrange),
                ("a", Call::Measure),
                ("root", Call::Measure),
                ("root", Call::Arrange),
                ("a", Call::Measure),
                ("a", Call::Arrange),
            ]
        );
        assert!(tree.is_measure_valid(a));
        assert!(tree.manager().is_settled());
    }

    #[test]
    fn callback_failure_clears_validity() {
        let (mut tree, _log, root, a, b) = chain(ProbeLayout::Stack);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        // `a` measures `b` directly, so both callbacks fail.
        tree.element_mut(b).fail_measure = true;
        tree.invalidate_measure(b);
        let err = tree.execute_layout_pass().unwrap_err();

        assert_eq!(err.node(), Some(root));
        for n in [root, a, b] {
            assert!(!tree.is_measure_valid(n));
        }
    }

    #[test]
    fn queued_node_moved_deeper_is_measured_at_its_new_depth() {
        let log = ProbeLog::default();
        let mut tree = Tree::new();
        let mk = |name| Probe::leaf(name, 10.0, 10.0).layout(ProbeLayout::Opaque).log(&log);
        let root = tree.create_node(mk("root"));
        let a = tree.create_node(mk("a"));
        let c = tree.create_node(mk("c"));
        let x = tree.create_node(mk("x"));
        tree.add_child(root, a);
        tree.add_child(root, c);
        tree.add_child(c, x);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        // `a` is queued at depth 1, then moved to depth 3 under `x`.
        tree.invalidate_measure(a);
        tree.invalidate_measure(x);
        tree.reparent(a, x);
        assert_eq!(tree.depth(a), 3);
        log.clear();
        tree.execute_layout_pass().unwrap();

        assert_eq!(log.measures(), vec!["root", "c", "x", "a"]);
        assert!(tree.is_arrange_valid(a));
        assert!(tree.manager().is_settled());
    }

    #[test]
    fn arrange_waits_for_pending_measure() {
        let log = ProbeLog::default();
        let mut tree = Tree::new();
        let mk = |name| Probe::leaf(name, 10.0, 10.0).layout(ProbeLayout::Opaque).log(&log);
        let root = tree.create_node(mk("root"));
        let a = tree.create_node(mk("a"));
        let c = tree.create_node(mk("c"));
        tree.add_child(root, a);
        tree.add_child(root, c);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();

        // Measuring `a` invalidates `c`, and through it `root`, after the
        // measure step has already moved past depth 0.
        tree.element_mut(a).on_measure_once = Some((c, Invalidate::Measure));
        tree.invalidate_measure(a);
        log.clear();
        let stats = tree.execute_layout_pass().unwrap();

        assert_eq!(
            log.calls(),
            vec![
                ("root", Call::Measure),
                ("root", Call::Arrange),
                ("a", Call::Measure),
                ("root", Call::Measure),
                ("root", Call::Arrange),
                ("c", Call::Measure),
                ("a", Call::Arrange),
                ("c", Call::Arrange),
            ]
        );
        assert_eq!(stats.arranged, 4);
        for n in [root, a, c] {
            assert!(tree.is_measure_valid(n));
            assert!(tree.is_arrange_valid(n));
        }
    }

    #[test]
    fn never_arranged_child_lands_at_origin() {
        let (mut tree, _log, root, a, _b) = chain(ProbeLayout::Opaque);
        tree.execute_initial_layout_pass(root, RootConstraints::UNCONSTRAINED)
            .unwrap();
        assert_eq!(tree.bounds(a), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn independent_trees_have_independent_managers() {
        let (mut first, _l1, r1, _a1, b1) = chain(ProbeLayout::Stack);
        let (mut second, _l2, r2, _a2, _b2) = chain(ProbeLayout::Stack);
        first
            .execute_initial_layout_pass(r1, RootConstraints::UNCONSTRAINED)
            .unwrap();
        second
            .execute_initial_layout_pass(r2, RootConstraints::UNCONSTRAINED)
            .unwrap();

        first.invalidate_measure(b1);
        assert!(!first.manager().is_settled());
        assert!(second.manager().is_settled());
        assert_eq!(first.manager().passes_started(), 1);
        assert_eq!(second.manager().passes_started(), 1);
    }
}
