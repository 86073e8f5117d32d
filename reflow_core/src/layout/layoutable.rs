// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element capability contract and the per-node measure/arrange
//! operations that invoke it.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Rect, Size};

use super::id::{INVALID, NodeId};
use super::store::LayoutTree;
use crate::dirty;
use crate::root::UNBOUNDED;
use crate::trace::Tracer;

/// Sizing and positioning callbacks for one kind of element.
///
/// The tree never computes a size itself. It decides *when* to call these
/// methods and with which constraint, and caches what they return.
///
/// Both callbacks may lay out their node's direct children through `cx`
/// ([`measure_child`](LayoutCx::measure_child),
/// [`arrange_child`](LayoutCx::arrange_child)). A child laid out this way is
/// marked valid, so if it was also queued the manager skips it later.
pub trait Layoutable: Sized {
    /// Failure type of the callbacks. Use [`core::convert::Infallible`] for
    /// elements that cannot fail.
    type Error;

    /// Returns the size this element would like, given `available` space.
    ///
    /// Either axis of `available` may be infinite.
    fn measure(
        &mut self,
        cx: &mut LayoutCx<'_, '_, Self>,
        available: Size,
    ) -> Result<Size, Self::Error>;

    /// Positions this element (and usually its children) within `final_rect`.
    fn arrange(
        &mut self,
        cx: &mut LayoutCx<'_, '_, Self>,
        final_rect: Rect,
    ) -> Result<(), Self::Error>;
}

/// A callback's view of the tree while its node is being laid out.
///
/// The node's own element is moved out of the tree for the duration of the
/// callback; it is the `&mut self` of [`Layoutable::measure`] and
/// [`Layoutable::arrange`].
pub struct LayoutCx<'a, 't, L: Layoutable> {
    pub(crate) tree: &'a mut LayoutTree<L>,
    pub(crate) tracer: &'a mut Tracer<'t>,
    pub(crate) node: NodeId,
}

impl<L: Layoutable> fmt::Debug for LayoutCx<'_, '_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutCx")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl<L: Layoutable> LayoutCx<'_, '_, L> {
    /// The node whose callback is running.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Read access to the whole tree.
    #[must_use]
    pub fn tree(&self) -> &LayoutTree<L> {
        &*self.tree
    }

    /// The direct children of this node, in order.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        self.tree.children(self.node).collect()
    }

    /// Returns an element, or `None` for an element whose callback is
    /// running (including this node's own).
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&L> {
        self.tree.validate(id);
        self.tree.elements[id.idx as usize].as_ref()
    }

    /// Mutable variant of [`element`](Self::element).
    #[must_use]
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut L> {
        self.tree.validate(id);
        self.tree.elements[id.idx as usize].as_mut()
    }

    /// The child's last desired size. See [`LayoutTree::desired_size`].
    #[must_use]
    pub fn desired_size(&self, child: NodeId) -> Option<Size> {
        self.tree.desired_size(child)
    }

    /// Measures a direct child.
    ///
    /// If the child is already measure-valid for exactly this `available`
    /// size, its cached desired size is returned without calling it.
    ///
    /// # Panics
    ///
    /// Panics if `child` is stale or is not a direct child of this node.
    pub fn measure_child(&mut self, child: NodeId, available: Size) -> Result<Size, L::Error> {
        self.assert_child(child);
        self.tree.measure_child_at(child.idx, available, self.tracer)
    }

    /// Arranges a direct child in `rect`.
    ///
    /// A measure-invalid child is measured first, with its previous
    /// constraint. A child already arranged in exactly `rect` is left alone.
    ///
    /// # Panics
    ///
    /// Panics if `child` is stale or is not a direct child of this node.
    pub fn arrange_child(&mut self, child: NodeId, rect: Rect) -> Result<(), L::Error> {
        self.assert_child(child);
        self.tree.arrange_child_at(child.idx, rect, self.tracer)
    }

    /// See [`LayoutTree::invalidate_measure`].
    pub fn invalidate_measure(&mut self, id: NodeId) {
        self.tree.invalidate_measure(id);
    }

    /// See [`LayoutTree::invalidate_arrange`].
    pub fn invalidate_arrange(&mut self, id: NodeId) {
        self.tree.invalidate_arrange(id);
    }

    /// Appends `child` to this node's children.
    ///
    /// Intended for elements that realize children lazily during measure.
    /// This invalidates the node's own measure, so it is measured again later
    /// in the pass. See [`LayoutTree::add_child`].
    pub fn add_child(&mut self, child: NodeId) {
        self.tree.add_child(self.node, child);
    }

    /// Removes a direct child. See [`LayoutTree::remove_from_parent`].
    ///
    /// # Panics
    ///
    /// Panics if `child` is stale or is not a direct child of this node.
    pub fn remove_child(&mut self, child: NodeId) {
        self.assert_child(child);
        self.tree.remove_from_parent(child);
    }

    fn assert_child(&self, child: NodeId) {
        self.tree.validate(child);
        assert!(
            self.tree.parent[child.idx as usize] == self.node.idx,
            "{child:?} is not a child of {:?}",
            self.node
        );
    }
}

impl<L: Layoutable> LayoutTree<L> {
    /// Measures `idx` unless it is already valid for `available`.
    pub(crate) fn measure_child_at(
        &mut self,
        idx: u32,
        available: Size,
        tracer: &mut Tracer<'_>,
    ) -> Result<Size, L::Error> {
        let i = idx as usize;
        if self.measure_valid[i] && self.previous_measure[i] == Some(available) {
            if let Some(desired) = self.desired_size[i] {
                return Ok(desired);
            }
        }
        self.measure_node(idx, available, false, tracer)
    }

    /// Arranges `idx` in `rect` unless it is already there.
    pub(crate) fn arrange_child_at(
        &mut self,
        idx: u32,
        rect: Rect,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), L::Error> {
        let i = idx as usize;
        if !self.measure_valid[i] {
            let available = self.previous_measure[i].unwrap_or(UNBOUNDED);
            self.measure_node(idx, available, false, tracer)?;
        }
        if self.arrange_valid[i] && self.previous_arrange[i] == Some(rect) {
            return Ok(());
        }
        self.arrange_node(idx, rect, false, tracer)
    }

    /// Runs the measure callback of `idx` and records the result.
    ///
    /// The node is marked valid before the callback runs, so an invalidation
    /// of the node raised during its own callback survives it. On failure
    /// nothing is recorded: the node keeps its previous desired size and is
    /// left measure-invalid.
    pub(crate) fn measure_node(
        &mut self,
        idx: u32,
        available: Size,
        queued: bool,
        tracer: &mut Tracer<'_>,
    ) -> Result<Size, L::Error> {
        let id = self.id_at(idx);
        let i = idx as usize;
        let Some(mut element) = self.elements[i].take() else {
            panic!("{id:?} is already being laid out");
        };
        self.measure_valid[i] = true;
        let result = {
            let mut cx = LayoutCx {
                tree: &mut *self,
                tracer: &mut *tracer,
                node: id,
            };
            element.measure(&mut cx, available)
        };
        self.elements[i] = Some(element);
        let desired = result.inspect_err(|_| self.measure_valid[i] = false)?;

        if self.desired_size[i] != Some(desired) {
            self.dirty.mark(idx, dirty::DESIRED_SIZE);
        }
        self.desired_size[i] = Some(desired);
        self.previous_measure[i] = Some(available);
        self.manager.stats.measured += 1;

        #[cfg(feature = "trace-rich")]
        tracer.measure(&crate::trace::MeasureEvent {
            pass_index: self.manager.pass_index,
            node: id,
            depth: self.depth[i],
            available,
            desired,
            queued,
        });
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = queued;
        }

        Ok(desired)
    }

    /// Runs the arrange callback of `idx` and records the result.
    ///
    /// Validity follows [`measure_node`](Self::measure_node): set up front,
    /// cleared again if the callback fails.
    pub(crate) fn arrange_node(
        &mut self,
        idx: u32,
        rect: Rect,
        queued: bool,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), L::Error> {
        let id = self.id_at(idx);
        let i = idx as usize;
        let Some(mut element) = self.elements[i].take() else {
            panic!("{id:?} is already being laid out");
        };
        self.arrange_valid[i] = true;
        let result = {
            let mut cx = LayoutCx {
                tree: &mut *self,
                tracer: &mut *tracer,
                node: id,
            };
            element.arrange(&mut cx, rect)
        };
        self.elements[i] = Some(element);
        result.inspect_err(|_| self.arrange_valid[i] = false)?;

        if self.previous_arrange[i] != Some(rect) {
            self.dirty.mark(idx, dirty::BOUNDS);
        }
        self.previous_arrange[i] = Some(rect);
        self.manager.stats.arranged += 1;

        #[cfg(feature = "trace-rich")]
        tracer.arrange(&crate::trace::ArrangeEvent {
            pass_index: self.manager.pass_index,
            node: id,
            depth: self.depth[i],
            rect,
            queued,
        });
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = queued;
        }

        Ok(())
    }

    /// The parent slot of `idx`, or `None` for the root and detached tops.
    pub(crate) fn parent_slot(&self, idx: u32) -> Option<u32> {
        let p = self.parent[idx as usize];
        (p != INVALID).then_some(p)
    }
}
