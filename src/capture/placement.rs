pub const ANCHOR_OFFSET: f64 = 12.0;
pub const EDGE_MARGIN: f64 = 8.0;
pub const TOOLTIP_WIDTH: f64 = 320.0;
/// Tooltip width plus room for its border and the right-hand margin.
pub const RESERVED_WIDTH: f64 = 340.0;
pub const RESERVED_HEIGHT: f64 = 180.0;
const MAX_WIDTH_INSET: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Rendered width: the fixed width unless the viewport is narrower.
    pub fn tooltip_width(&self) -> f64 {
        TOOLTIP_WIDTH.min(self.width - MAX_WIDTH_INSET).max(0.0)
    }
}

/// Where the tooltip is drawn: top-left corner in viewport coordinates plus
/// the width the surface should render it at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub left: f64,
    pub top: f64,
    pub width: f64,
}

pub fn anchor_for(x: f64, y: f64, viewport: Viewport) -> Anchor {
    Anchor {
        left: clamp(
            x + ANCHOR_OFFSET,
            EDGE_MARGIN,
            viewport.width - RESERVED_WIDTH,
        ),
        top: clamp(
            y + ANCHOR_OFFSET,
            EDGE_MARGIN,
            viewport.height - RESERVED_HEIGHT,
        ),
        width: viewport.tooltip_width(),
    }
}

// The lower bound wins when the viewport is too small for the tooltip.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    min.max(max.min(value))
}
