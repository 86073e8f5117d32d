// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A configurable element for exercising the tree in tests.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::{Rect, Size};
use thiserror::Error;

use super::id::NodeId;
use super::layoutable::{LayoutCx, Layoutable};
use crate::root::UNBOUNDED;

/// How a [`Probe`] treats its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum ProbeLayout {
    /// Children are measured with the available width and stacked
    /// vertically, each spanning the full arrange width.
    #[default]
    Stack,
    /// Children are measured unbounded and all placed at the origin at their
    /// desired size.
    Overlay,
    /// Children are never touched; only the manager lays them out.
    Opaque,
}

/// Which callback a probe records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Measure,
    Arrange,
}

/// What a probe invalidates at the end of a callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Invalidate {
    Measure,
    Arrange,
}

/// Callback order shared between several probes.
#[derive(Clone, Debug, Default)]
pub(crate) struct ProbeLog(Rc<RefCell<Vec<(&'static str, Call)>>>);

impl ProbeLog {
    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub(crate) fn calls(&self) -> Vec<(&'static str, Call)> {
        self.0.borrow().clone()
    }

    /// Names of measured probes, in call order.
    pub(crate) fn measures(&self) -> Vec<&'static str> {
        self.0
            .borrow()
            .iter()
            .filter(|(_, call)| *call == Call::Measure)
            .map(|(name, _)| *name)
            .collect()
    }

    fn push(&self, name: &'static str, call: Call) {
        self.0.borrow_mut().push((name, call));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("probe `{0}` failed")]
pub(crate) struct ProbeFailure(pub(crate) &'static str);

#[derive(Debug)]
pub(crate) struct Probe {
    pub(crate) name: &'static str,
    /// Own content size; the desired size never goes below it.
    pub(crate) size: Size,
    pub(crate) layout: ProbeLayout,
    pub(crate) measured: u32,
    pub(crate) arranged: u32,
    pub(crate) last_available: Option<Size>,
    pub(crate) last_rect: Option<Rect>,
    pub(crate) fail_measure: bool,
    pub(crate) fail_arrange: bool,
    /// Fired at the end of every arrange.
    pub(crate) on_arrange: Option<(NodeId, Invalidate)>,
    /// Fired at the end of the next measure only.
    pub(crate) on_measure_once: Option<(NodeId, Invalidate)>,
    /// Fired at the end of the next arrange only.
    pub(crate) on_arrange_once: Option<(NodeId, Invalidate)>,
    log: Option<ProbeLog>,
}

impl Probe {
    pub(crate) fn leaf(name: &'static str, width: f64, height: f64) -> Self {
        Self {
            name,
            size: Size::new(width, height),
            layout: ProbeLayout::default(),
            measured: 0,
            arranged: 0,
            last_available: None,
            last_rect: None,
            fail_measure: false,
            fail_arrange: false,
            on_arrange: None,
            on_measure_once: None,
            on_arrange_once: None,
            log: None,
        }
    }

    pub(crate) fn layout(mut self, layout: ProbeLayout) -> Self {
        self.layout = layout;
        self
    }

    pub(crate) fn log(mut self, log: &ProbeLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    fn record(&self, call: Call) {
        if let Some(log) = &self.log {
            log.push(self.name, call);
        }
    }
}

impl Layoutable for Probe {
    type Error = ProbeFailure;

    fn measure(
        &mut self,
        cx: &mut LayoutCx<'_, '_, Self>,
        available: Size,
    ) -> Result<Size, ProbeFailure> {
        self.record(Call::Measure);
        self.measured += 1;
        self.last_available = Some(available);
        if self.fail_measure {
            return Err(ProbeFailure(self.name));
        }

        let mut desired = self.size;
        match self.layout {
            ProbeLayout::Stack => {
                let mut height = 0.0;
                let constraint = Size::new(available.width, f64::INFINITY);
                for child in cx.children() {
                    let size = cx.measure_child(child, constraint)?;
                    desired.width = desired.width.max(size.width);
                    height += size.height;
                }
                desired.height = desired.height.max(height);
            }
            ProbeLayout::Overlay => {
                for child in cx.children() {
                    let size = cx.measure_child(child, UNBOUNDED)?;
                    desired.width = desired.width.max(size.width);
                    desired.height = desired.height.max(size.height);
                }
            }
            ProbeLayout::Opaque => {}
        }

        if let Some(hook) = self.on_measure_once.take() {
            fire(cx, hook);
        }
        Ok(desired)
    }

    fn arrange(
        &mut self,
        cx: &mut LayoutCx<'_, '_, Self>,
        final_rect: Rect,
    ) -> Result<(), ProbeFailure> {
        self.record(Call::Arrange);
        self.arranged += 1;
        self.last_rect = Some(final_rect);
        if self.fail_arrange {
            return Err(ProbeFailure(self.name));
        }

        match self.layout {
            ProbeLayout::Stack => {
                let mut y = final_rect.y0;
                for child in cx.children() {
                    let height = cx.desired_size(child).map_or(0.0, |s| s.height);
                    let slot = Rect::new(final_rect.x0, y, final_rect.x1, y + height);
                    cx.arrange_child(child, slot)?;
                    y += height;
                }
            }
            ProbeLayout::Overlay => {
                for child in cx.children() {
                    let size = cx.desired_size(child).unwrap_or(Size::ZERO);
                    cx.arrange_child(child, Rect::from_origin_size(final_rect.origin(), size))?;
                }
            }
            ProbeLayout::Opaque => {}
        }

        if let Some(hook) = self.on_arrange {
            fire(cx, hook);
        }
        if let Some(hook) = self.on_arrange_once.take() {
            fire(cx, hook);
        }
        Ok(())
    }
}

fn fire(cx: &mut LayoutCx<'_, '_, Probe>, (node, what): (NodeId, Invalidate)) {
    match what {
        Invalidate::Measure => cx.invalidate_measure(node),
        Invalidate::Arrange => cx.invalidate_arrange(node),
    }
}
