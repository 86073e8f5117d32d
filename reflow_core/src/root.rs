// Copyright 2026 the Reflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sizing policy for the layout root.
//!
//! Every other node is measured with the constraint its parent last handed
//! it. The root has no parent, so its constraint comes from the host: an
//! explicit width and height if the host set them, otherwise no bound at all.
//! The platform's maximum client area never limits what the root may ask
//! for; it only clips where the root is placed.
//!
//! The policy is re-evaluated every time the root is measured or arranged,
//! so changing it (through
//! [`LayoutTree::set_root_width`](crate::layout::LayoutTree::set_root_width)
//! and friends) takes effect on the next pass.

use kurbo::{Point, Rect, Size};

/// A size with no bound on either axis.
pub const UNBOUNDED: Size = Size::new(f64::INFINITY, f64::INFINITY);

/// Host-supplied sizing constraints for the layout root.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RootConstraints {
    /// Explicit root width, if the host fixed one.
    pub width: Option<f64>,
    /// Explicit root height, if the host fixed one.
    pub height: Option<f64>,
    /// Largest area the platform can give the root (e.g. a window's maximum
    /// client size).
    pub max_client_size: Option<Size>,
}

impl RootConstraints {
    /// Constraints with no explicit size and no client bound.
    pub const UNCONSTRAINED: Self = Self {
        width: None,
        height: None,
        max_client_size: None,
    };

    /// Returns these constraints with an explicit width.
    #[must_use]
    pub const fn with_width(self, width: f64) -> Self {
        Self {
            width: Some(width),
            ..self
        }
    }

    /// Returns these constraints with an explicit height.
    #[must_use]
    pub const fn with_height(self, height: f64) -> Self {
        Self {
            height: Some(height),
            ..self
        }
    }

    /// Returns these constraints with a maximum client size.
    #[must_use]
    pub const fn with_max_client_size(self, size: Size) -> Self {
        Self {
            max_client_size: Some(size),
            ..self
        }
    }

    /// The available size to measure the root with.
    ///
    /// Per axis: the explicit size if set, otherwise infinity. The maximum
    /// client size is ignored here.
    #[must_use]
    pub fn available_size(&self) -> Size {
        Size::new(
            self.width.unwrap_or(UNBOUNDED.width),
            self.height.unwrap_or(UNBOUNDED.height),
        )
    }

    /// The rectangle to arrange the root in, given its measured size.
    ///
    /// Per axis: the larger of `desired` and the explicit size, clamped to
    /// the maximum client size. The rectangle is anchored at the origin.
    #[must_use]
    pub fn arrange_rect(&self, desired: Size) -> Rect {
        let mut size = Size::new(
            self.width.map_or(desired.width, |w| w.max(desired.width)),
            self.height.map_or(desired.height, |h| h.max(desired.height)),
        );
        if let Some(max) = self.max_client_size {
            size = Size::new(size.width.min(max.width), size.height.min(max.height));
        }
        Rect::from_origin_size(Point::ORIGIN, size)
    }
}
