// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, invalidation,
//! and layout-state management.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker};

use super::id::{INVALID, NodeId};
use super::manager::{LayoutConfig, LayoutManager, LayoutPhase};
use super::queue::InvalidationQueue;
use super::traverse::Children;
use crate::dirty;
use crate::root::RootConstraints;

/// Struct-of-arrays storage for a tree of layout elements.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; destroyed nodes are recycled via a free list, and
/// generation counters prevent stale handle access.
///
/// A child is owned by its parent's child list; the parent link is a plain
/// slot index. A node is *attached* when its parent chain reaches the
/// [root](Self::root). Only attached nodes are ever scheduled or laid out.
#[derive(Debug)]
pub struct LayoutTree<L> {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) depth: Vec<u32>,
    pub(crate) attached: Vec<bool>,

    // -- Elements (moved out while their own callback runs) --
    pub(crate) elements: Vec<Option<L>>,

    // -- Layout state --
    pub(crate) measure_valid: Vec<bool>,
    pub(crate) arrange_valid: Vec<bool>,
    pub(crate) desired_size: Vec<Option<Size>>,
    pub(crate) previous_measure: Vec<Option<Size>>,
    pub(crate) previous_arrange: Vec<Option<Rect>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Root --
    pub(crate) root: u32,
    pub(crate) root_constraints: RootConstraints,

    // -- Scheduling --
    pub(crate) manager: LayoutManager,

    // -- Change tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl<L> Default for LayoutTree<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> LayoutTree<L> {
    /// Creates an empty tree with the default [`LayoutConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    /// Creates an empty tree.
    #[must_use]
    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            depth: Vec::new(),
            attached: Vec::new(),
            elements: Vec::new(),
            measure_valid: Vec::new(),
            arrange_valid: Vec::new(),
            desired_size: Vec::new(),
            previous_measure: Vec::new(),
            previous_arrange: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            root_constraints: RootConstraints::UNCONSTRAINED,
            manager: LayoutManager::new(config),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new node holding `element` and returns its handle.
    ///
    /// The node starts detached, with no parent, and with both measure and
    /// arrange invalid. It is scheduled once it becomes attached.
    pub fn create_node(&mut self, element: L) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.depth[i] = 0;
            self.attached[i] = false;
            self.elements[i] = Some(element);
            self.measure_valid[i] = false;
            self.arrange_valid[i] = false;
            self.desired_size[i] = None;
            self.previous_measure[i] = None;
            self.previous_arrange[i] = None;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.depth.push(0);
            self.attached.push(false);
            self.elements.push(Some(element));
            self.measure_valid.push(false);
            self.arrange_valid.push(false);
            self.desired_size.push(None);
            self.previous_measure.push(None);
            self.previous_arrange.push(None);
            self.generation.push(0);
            idx
        };

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a node, freeing its slot for reuse, and returns its element.
    ///
    /// If the node is attached to a parent it is removed first, which
    /// invalidates the parent's measure. Destroying the root leaves the tree
    /// without a root.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId) -> L {
        self.validate(id);
        let idx = id.idx;
        let i = idx as usize;
        assert!(
            self.first_child[i] == INVALID,
            "cannot destroy node with children"
        );

        if self.parent[i] != INVALID {
            self.detach(idx);
        }
        if self.root == idx {
            self.root = INVALID;
            self.attached[i] = false;
        }

        self.manager.measure_queue.remove(id);
        self.manager.arrange_queue.remove(id);
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[i] += 1;
        self.free_list.push(idx);
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        let Some(element) = self.elements[i].take() else {
            panic!("cannot destroy {id:?} while it is being laid out");
        };
        element
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// If `parent` is attached, `child`'s subtree becomes attached: depths
    /// are recomputed and every invalid node in it is scheduled. The parent's
    /// measure is invalidated either way.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, if
    /// `child` is the root, or if `parent` lies inside `child`'s subtree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        self.assert_adoptable(p, c);

        self.link_last(p, c);
        self.attach(p, c);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    /// Attachment and invalidation follow [`add_child`](Self::add_child).
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, `sibling`
    /// has no parent, or the insertion would create a cycle.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        self.assert_adoptable(p, c);

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.attach(p, c);
    }

    /// Removes `child` from its current parent.
    ///
    /// The child's subtree becomes detached: its queued work is dropped
    /// without running any callback, and it keeps its cached layout state.
    /// The former parent's measure is invalidated.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "node has no parent");
        self.detach(c);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` is the root, or if
    /// `new_parent` lies inside `child`'s subtree.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        self.validate(child);
        self.validate(new_parent);

        if self.parent[child.idx as usize] != INVALID {
            self.detach(child.idx);
        }
        self.assert_adoptable(new_parent.idx, child.idx);
        self.link_last(new_parent.idx, child.idx);
        self.attach(new_parent.idx, child.idx);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(self.id_at(p))
        }
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_, L> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the layout root, if one has been installed by
    /// [`execute_initial_layout_pass`](Self::execute_initial_layout_pass).
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        if self.root == INVALID {
            None
        } else {
            Some(self.id_at(self.root))
        }
    }

    /// Returns whether the node is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.validate(id);
        self.attached[id.idx as usize]
    }

    /// Returns the node's distance from the root.
    ///
    /// Only meaningful while the node [is attached](Self::is_attached).
    #[must_use]
    pub fn depth(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.depth[id.idx as usize]
    }

    // -- Element access --

    /// Returns the node's element.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or if called on a node whose own
    /// callback is running (see [`LayoutCx::element`](super::LayoutCx::element)).
    #[must_use]
    pub fn element(&self, id: NodeId) -> &L {
        self.validate(id);
        match &self.elements[id.idx as usize] {
            Some(element) => element,
            None => panic!("{id:?} is being laid out"),
        }
    }

    /// Returns the node's element mutably.
    ///
    /// Mutating an element does not invalidate anything; call
    /// [`invalidate_measure`](Self::invalidate_measure) or
    /// [`invalidate_arrange`](Self::invalidate_arrange) for changes that
    /// affect layout.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn element_mut(&mut self, id: NodeId) -> &mut L {
        self.validate(id);
        match &mut self.elements[id.idx as usize] {
            Some(element) => element,
            None => panic!("{id:?} is being laid out"),
        }
    }

    // -- Layout state getters --

    /// Returns the size produced by the node's last successful measure.
    ///
    /// Not authoritative while [`is_measure_valid`](Self::is_measure_valid)
    /// is `false`.
    #[must_use]
    pub fn desired_size(&self, id: NodeId) -> Option<Size> {
        self.validate(id);
        self.desired_size[id.idx as usize]
    }

    /// Returns the available size passed to the node's last measure.
    #[must_use]
    pub fn previous_measure(&self, id: NodeId) -> Option<Size> {
        self.validate(id);
        self.previous_measure[id.idx as usize]
    }

    /// Returns the rectangle passed to the node's last arrange.
    #[must_use]
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.validate(id);
        self.previous_arrange[id.idx as usize]
    }

    /// Returns whether the node's desired size is current.
    #[must_use]
    pub fn is_measure_valid(&self, id: NodeId) -> bool {
        self.validate(id);
        self.measure_valid[id.idx as usize]
    }

    /// Returns whether the node's placement is current.
    #[must_use]
    pub fn is_arrange_valid(&self, id: NodeId) -> bool {
        self.validate(id);
        self.arrange_valid[id.idx as usize]
    }

    // -- Raw-index accessors for hosts --
    //
    // These accept raw slot indices (as found in `LayoutChanges`) rather than
    // `NodeId` handles, skipping generation validation.

    /// Returns the desired size at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn desired_size_at(&self, idx: u32) -> Option<Size> {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.desired_size[idx as usize]
    }

    /// Returns the arranged bounds at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn bounds_at(&self, idx: u32) -> Option<Rect> {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.previous_arrange[idx as usize]
    }

    // -- Scheduling state --

    /// Returns the manager's current phase.
    #[must_use]
    pub fn phase(&self) -> LayoutPhase {
        self.manager.phase
    }

    /// Returns the layout manager driving this tree.
    #[must_use]
    pub fn manager(&self) -> &LayoutManager {
        &self.manager
    }

    /// Nodes awaiting measure.
    #[must_use]
    pub fn pending_measure(&self) -> &InvalidationQueue {
        &self.manager.measure_queue
    }

    /// Nodes awaiting arrange.
    #[must_use]
    pub fn pending_arrange(&self) -> &InvalidationQueue {
        &self.manager.arrange_queue
    }

    // -- Root constraints (auto-invalidate the root) --

    /// Returns the root sizing constraints.
    #[must_use]
    pub fn root_constraints(&self) -> RootConstraints {
        self.root_constraints
    }

    /// Replaces the root sizing constraints.
    ///
    /// Invalidates the root's measure if it changed anything.
    pub fn set_root_constraints(&mut self, constraints: RootConstraints) {
        if self.root_constraints == constraints {
            return;
        }
        self.root_constraints = constraints;
        if self.root != INVALID {
            self.invalidate_measure_at(self.root);
        }
    }

    /// Sets or clears the root's explicit width.
    pub fn set_root_width(&mut self, width: Option<f64>) {
        self.set_root_constraints(RootConstraints {
            width,
            ..self.root_constraints
        });
    }

    /// Sets or clears the root's explicit height.
    pub fn set_root_height(&mut self, height: Option<f64>) {
        self.set_root_constraints(RootConstraints {
            height,
            ..self.root_constraints
        });
    }

    /// Sets or clears the platform's maximum client size.
    pub fn set_max_client_size(&mut self, size: Option<Size>) {
        self.set_root_constraints(RootConstraints {
            max_client_size: size,
            ..self.root_constraints
        });
    }

    // -- Invalidation API --

    /// Marks the node's desired size stale.
    ///
    /// Also invalidates the node's arrange. If the node's measure was valid,
    /// the parent's measure is invalidated in turn, up to the first ancestor
    /// that was already invalid. Every touched node that is attached is
    /// scheduled for measure and arrange; detached nodes are only flagged.
    pub fn invalidate_measure(&mut self, id: NodeId) {
        self.validate(id);
        self.invalidate_measure_at(id.idx);
    }

    /// Marks the node's placement stale.
    ///
    /// Touches neither the node's measure nor any ancestor.
    pub fn invalidate_arrange(&mut self, id: NodeId) {
        self.validate(id);
        self.invalidate_arrange_at(id.idx);
    }

    pub(crate) fn invalidate_measure_at(&mut self, idx: u32) {
        let mut current = idx;
        loop {
            let i = current as usize;
            let was_valid = self.measure_valid[i];
            self.measure_valid[i] = false;
            self.arrange_valid[i] = false;
            self.schedule(current, true, true);

            let parent = self.parent[i];
            if !was_valid || parent == INVALID {
                break;
            }
            current = parent;
        }
    }

    pub(crate) fn invalidate_arrange_at(&mut self, idx: u32) {
        self.arrange_valid[idx as usize] = false;
        self.schedule(idx, false, true);
    }

    /// Queues an attached node for the requested work.
    pub(crate) fn schedule(&mut self, idx: u32, measure: bool, arrange: bool) {
        let i = idx as usize;
        if !self.attached[i] {
            return;
        }
        let id = self.id_at(idx);
        let depth = self.depth[i];
        if measure {
            self.manager.measure_queue.enqueue(id, depth);
        }
        if arrange {
            self.manager.arrange_queue.enqueue(id, depth);
        }
    }

    // -- Internal helpers --

    /// Builds a handle for a live slot.
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Installs `idx` as the root and attaches its subtree at depth 0.
    pub(crate) fn install_root(&mut self, idx: u32) {
        assert!(
            self.parent[idx as usize] == INVALID,
            "layout root cannot have a parent"
        );
        if self.root == idx {
            return;
        }
        if self.root != INVALID {
            let old = self.root;
            self.set_subtree_detached(old);
            self.dirty.mark(old, dirty::TOPOLOGY);
        }
        self.root = idx;
        self.attach_subtree(idx, 0);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    fn assert_adoptable(&self, p: u32, c: u32) {
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(c != self.root, "the layout root cannot be a child");
        let mut ancestor = p;
        while ancestor != INVALID {
            assert!(ancestor != c, "cannot add a node to its own subtree");
            ancestor = self.parent[ancestor as usize];
        }
    }

    /// Appends `c` to `p`'s child list.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Attach notification: `c` was just linked under `p`.
    fn attach(&mut self, p: u32, c: u32) {
        if self.attached[p as usize] {
            let depth = self.depth[p as usize] + 1;
            self.attach_subtree(c, depth);
        }
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.invalidate_measure_at(p);
    }

    /// Detach notification: unlinks `c` from its parent.
    fn detach(&mut self, c: u32) {
        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        if self.attached[c as usize] {
            self.set_subtree_detached(c);
        }
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.invalidate_measure_at(p);
    }

    /// Removes `idx` from its parent's child list without touching any other
    /// state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Marks the subtree at `idx` attached with `idx` at `depth`, and
    /// schedules every invalid node in it, in document order.
    fn attach_subtree(&mut self, idx: u32, depth: u32) {
        let mut stack = vec![(idx, depth)];
        let mut kids = Vec::new();
        while let Some((n, d)) = stack.pop() {
            let i = n as usize;
            self.depth[i] = d;
            self.attached[i] = true;
            let measure = !self.measure_valid[i];
            let arrange = !self.arrange_valid[i];
            self.schedule(n, measure, arrange);

            kids.clear();
            let mut child = self.first_child[i];
            while child != INVALID {
                kids.push(child);
                child = self.next_sibling[child as usize];
            }
            stack.extend(kids.iter().rev().map(|&k| (k, d + 1)));
        }
    }

    fn set_subtree_detached(&mut self, idx: u32) {
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            self.attached[n as usize] = false;
            let mut child = self.first_child[n as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
    }
}
