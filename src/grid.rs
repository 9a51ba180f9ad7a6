use num_complex::Complex;

use crate::{screen, viewport::Viewport};

/// Maps pixel coordinates onto the complex plane for one viewport.
///
/// Pixel `(x, y)` maps to `origin_x + x * width / W` on the real axis and
/// `origin_y + y * height / H` on the imaginary axis. Rows are laid out
/// with [`screen::Size::index`].
#[derive(Clone, Copy, Debug)]
pub struct ComplexGrid {
    size: screen::Size,
    origin: Complex<f64>,
    step: (f64, f64),
}

impl ComplexGrid {
    pub fn new(viewport: &Viewport, size: screen::Size) -> Self {
        Self {
            size,
            origin: Complex::new(viewport.origin_x, viewport.origin_y),
            step: viewport.step(size),
        }
    }

    pub fn point(&self, x: u32, y: u32) -> Complex<f64> {
        Complex::new(
            self.origin.re + x as f64 * self.step.0,
            self.origin.im + y as f64 * self.step.1,
        )
    }

    /// The point for a row-major buffer index.
    pub fn point_at(&self, index: usize) -> Complex<f64> {
        let (x, y) = self.size.coordinates(index);
        self.point(x, y)
    }
}
