// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A vertical-stack element for exercising sinks against real passes.

use std::convert::Infallible;

use kurbo::{Rect, Size};
use reflow_core::layout::{LayoutCx, LayoutTree, Layoutable, NodeId};

#[derive(Debug)]
pub(crate) struct Block {
    pub(crate) size: Size,
}

impl Block {
    pub(crate) fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
        }
    }
}

impl Layoutable for Block {
    type Error = Infallible;

    fn measure(
        &mut self,
        cx: &mut LayoutCx<'_, '_, Self>,
        available: Size,
    ) -> Result<Size, Infallible> {
        let mut desired = self.size;
        for child in cx.children() {
            let size = cx.measure_child(child, available)?;
            desired.width = desired.width.max(size.width);
            desired.height += size.height;
        }
        Ok(desired)
    }

    fn arrange(
        &mut self,
        cx: &mut LayoutCx<'_, '_, Self>,
        final_rect: Rect,
    ) -> Result<(), Infallible> {
        let mut y = final_rect.y0 + self.size.height;
        for child in cx.children() {
            let height = cx.desired_size(child).map_or(0.0, |s| s.height);
            cx.arrange_child(child, Rect::new(final_rect.x0, y, final_rect.x1, y + height))?;
            y += height;
        }
        Ok(())
    }
}

/// `root (header 0x4) -> [a 20x10, b 30x10]`, not yet laid out.
pub(crate) fn sample_tree() -> (LayoutTree<Block>, NodeId, NodeId, NodeId) {
    let mut tree = LayoutTree::new();
    let root = tree.create_node(Block::new(0.0, 4.0));
    let a = tree.create_node(Block::new(20.0, 10.0));
    let b = tree.create_node(Block::new(30.0, 10.0));
    tree.add_child(root, a);
    tree.add_child(root, b);
    (tree, root, a, b)
}
