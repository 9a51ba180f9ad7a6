use num_complex::Complex;

/// Iteration state for one pixel.
///
/// The pixel's colour lives in the engine's separate colour buffer at the
/// same index, so the buffer can be handed to the renderer as-is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelState {
    pub current_value: Complex<f64>,
    /// The plane coordinate this pixel iterates; fixed for a viewport.
    pub constant: Complex<f64>,
    pub has_diverged: bool,
    pub is_bounded_candidate: bool,
}

/// Where a pixel escaped: the 0-based iteration and the value of `z` there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Escape {
    pub iteration: u32,
    pub value: Complex<f64>,
}

impl PixelState {
    pub fn new(constant: Complex<f64>) -> Self {
        Self {
            current_value: Complex::new(0.0, 0.0),
            constant,
            has_diverged: false,
            is_bounded_candidate: true,
        }
    }

    /// Runs iterations `first..first + steps` of `z <- z^2 + c`, stopping at
    /// the first whose magnitude squared exceeds `radius_sqr`.
    pub fn iterate(&mut self, first: u32, steps: u32, radius_sqr: f64) -> Option<Escape> {
        if self.has_diverged {
            return None;
        }
        for iteration in first..first + steps {
            self.current_value = self.current_value * self.current_value + self.constant;
            if self.is_bounded_candidate && self.current_value.norm_sqr() > radius_sqr {
                self.has_diverged = true;
                return Some(Escape {
                    iteration,
                    value: self.current_value,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        let mut pixel = PixelState::new(Complex::new(0.0, 0.0));
        assert_eq!(pixel.iterate(0, 10_000, 1e6), None);
        assert!(!pixel.has_diverged);
    }

    #[test]
    fn escape_reports_global_iteration() {
        let mut pixel = PixelState::new(Complex::new(2.0, 2.0));
        // z: 2+2i, 2+10i, -94+42i, 7074-7894i
        assert_eq!(pixel.iterate(10, 2, 1e6), None);
        let escape = pixel.iterate(12, 5, 1e6).unwrap();
        assert_eq!(escape.iteration, 13);
        assert_eq!(escape.value, Complex::new(7074.0, -7894.0));
        assert!(pixel.has_diverged);
    }

    #[test]
    fn diverged_pixel_is_left_alone() {
        let mut pixel = PixelState::new(Complex::new(2.0, 2.0));
        pixel.iterate(0, 10, 1e6).unwrap();
        let frozen = pixel;
        assert_eq!(pixel.iterate(10, 10, 1e6), None);
        assert_eq!(pixel, frozen);
    }
}
