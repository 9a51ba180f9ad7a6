//! Escape-count colouring.

use num_complex::Complex;

/// Colour of pixels that never escaped.
pub const BACKGROUND: u32 = 0;

/// Smoothed escape count for a value that escaped on the `iteration`th step
/// (0-based, counted from the start of the render).
///
/// Only meaningful once `|z|` is past the escape radius: for `|z| <= 1` the
/// double logarithm is undefined.
pub fn smooth_iteration(iteration: u32, z: Complex<f64>) -> f64 {
    debug_assert!(z.norm_sqr() > 1.0);
    iteration as f64 + 1.0 - z.norm().ln().ln() / std::f64::consts::LN_2
}

/// Packs a grey proportional to `smoothed / budget` as `0x00RRGGBB`.
pub fn grey(smoothed: f64, budget: u32) -> u32 {
    let level = (255.0 * smoothed / budget.max(1) as f64).clamp(0.0, 255.0);
    0x01_01_01 * level as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_subtracts_log_log_term() {
        let z = Complex::new(std::f64::consts::E.powf(std::f64::consts::E), 0.0);
        // ln(ln(e^e)) = 1
        let expected = 3.0 + 1.0 - 1.0 / std::f64::consts::LN_2;
        assert!((smooth_iteration(3, z) - expected).abs() < 1e-12);
    }

    #[test]
    fn grey_is_linear_in_budget_fraction() {
        assert_eq!(grey(0.0, 10), 0);
        assert_eq!(grey(5.0, 10), 0x7f7f7f);
        assert_eq!(grey(10.0, 10), 0xffffff);
    }

    #[test]
    fn grey_clamps_out_of_range_values() {
        assert_eq!(grey(-2.0, 10), 0);
        assert_eq!(grey(40.0, 10), 0xffffff);
        assert_eq!(grey(f64::NAN, 10), 0);
    }
}
