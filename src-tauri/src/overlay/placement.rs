//! Where to draw the highlight and its annotation bubble.
//!
//! Pure geometry: given the box and the viewport, pick the first side with
//! room for the bubble, in the order above, below, right, left. If no side
//! has room the bubble goes above anyway, clamped to the top margin, and
//! may overlap the box.

use serde::Serialize;

use crate::backend::BoundingBox;

/// Vertical room needed above or below the box.
pub const MIN_BUBBLE_HEIGHT: f64 = 80.0;
/// Horizontal room needed beside the box; also the bubble's width.
pub const BUBBLE_WIDTH: f64 = 250.0;
/// Nominal rendered bubble height.
pub const BUBBLE_HEIGHT: f64 = 60.0;
pub const BUBBLE_GAP: f64 = 10.0;
/// Smallest distance kept between the bubble and the viewport top.
pub const VIEWPORT_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Above,
    Below,
    Right,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bubble {
    pub x: f64,
    pub y: f64,
    pub anchor: Anchor,
}

impl Bubble {
    /// Nominal footprint as `(left, top, right, bottom)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.x, self.y, self.x + BUBBLE_WIDTH, self.y + BUBBLE_HEIGHT)
    }

    /// True when the footprint and `bbox` share interior area.
    pub fn overlaps(&self, bbox: &BoundingBox) -> bool {
        let (left, top, right, bottom) = self.bounds();
        left < bbox.x2 && right > bbox.x1 && top < bbox.y2 && bottom > bbox.y1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// The highlight, identical to the input box.
    pub rectangle: BoundingBox,
    pub bubble: Bubble,
    /// No side had room; the bubble may cover the box.
    pub fallback: bool,
}

pub fn place(bbox: BoundingBox, viewport_width: f64, viewport_height: f64) -> Placement {
    let space_above = bbox.y1;
    let space_below = viewport_height - bbox.y2;
    let space_right = viewport_width - bbox.x2;
    let space_left = bbox.x1;

    let above_y = bbox.y1 - BUBBLE_HEIGHT - BUBBLE_GAP;

    let (x, y, anchor, fallback) = if space_above >= MIN_BUBBLE_HEIGHT {
        (bbox.x1, above_y, Anchor::Above, false)
    } else if space_below >= MIN_BUBBLE_HEIGHT {
        (bbox.x1, bbox.y2 + BUBBLE_GAP, Anchor::Below, false)
    } else if space_right >= BUBBLE_WIDTH {
        (bbox.x2 + BUBBLE_GAP, bbox.y1, Anchor::Right, false)
    } else if space_left >= BUBBLE_WIDTH {
        (bbox.x1 - BUBBLE_WIDTH, bbox.y1, Anchor::Left, false)
    } else {
        (bbox.x1, above_y.max(VIEWPORT_MARGIN), Anchor::Above, true)
    };

    Placement {
        rectangle: bbox,
        bubble: Bubble { x, y, anchor },
        fallback,
    }
}
