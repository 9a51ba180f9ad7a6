//! The zoom selection rectangle.

use crate::{screen, viewport::PixelRect};

/// A rectangle half the grid's width and height whose top-left corner
/// follows the pointer, clamped so it always fits inside the grid.
#[derive(Clone, Copy, Debug)]
pub struct SelectionOverlay {
    size: screen::Size,
    rect: PixelRect,
}

impl SelectionOverlay {
    pub fn new(size: screen::Size) -> Self {
        Self {
            size,
            rect: PixelRect {
                x: 0,
                y: 0,
                width: (size.width / 2).max(1),
                height: (size.height / 2).max(1),
            },
        }
    }

    /// Moves the rectangle to the pointer at `(x, y)`. Positions outside the
    /// window (negative or past the far edge) are clamped.
    pub fn move_to(&mut self, x: f64, y: f64) {
        let max_x = self.size.width.saturating_sub(self.rect.width);
        let max_y = self.size.height.saturating_sub(self.rect.height);
        self.rect.x = clamp_coordinate(x, max_x);
        self.rect.y = clamp_coordinate(y, max_y);
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }
}

fn clamp_coordinate(value: f64, max: u32) -> u32 {
    if value.is_nan() {
        0
    } else {
        value.floor().clamp(0.0, max as f64) as u32
    }
}
