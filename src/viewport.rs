//! The region of the complex plane shown on screen.

use crate::screen;

/// A rectangle of the complex plane. `origin_x`/`origin_y` is the corner
/// mapped to pixel `(0, 0)`.
///
/// Viewports are replaced wholesale on zoom, never edited in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

/// A rectangle in pixel space, as produced by
/// [`SelectionOverlay`](crate::selection::SelectionOverlay).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Self {
        debug_assert!(width > 0.0 && height > 0.0);
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// Plane units per pixel along each axis.
    pub fn step(&self, size: screen::Size) -> (f64, f64) {
        (
            self.width / size.width as f64,
            self.height / size.height as f64,
        )
    }

    /// The sub-rectangle covered by `rect` on a grid of `size`.
    pub fn zoom_in(&self, size: screen::Size, rect: PixelRect) -> Self {
        let (step_x, step_y) = self.step(size);
        Self::new(
            self.origin_x + rect.x as f64 * step_x,
            self.origin_y + rect.y as f64 * step_y,
            rect.width.max(1) as f64 * step_x,
            rect.height.max(1) as f64 * step_y,
        )
    }

    /// Twice the extent, about the same centre.
    pub fn zoom_out(&self) -> Self {
        Self::new(
            self.origin_x - self.width / 2.0,
            self.origin_y - self.height / 2.0,
            self.width * 2.0,
            self.height * 2.0,
        )
    }
}

impl Default for Viewport {
    /// Frames the whole set on a 4:3 grid.
    fn default() -> Self {
        Self::new(-3.0, -1.5, 4.0, 3.0)
    }
}
