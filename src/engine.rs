//! The escape-time engine.
//!
//! Holds one [`PixelState`] and one packed colour per pixel of the grid, and
//! advances every pixel that hasn't yet escaped in parallel. Pixels never
//! read each other's state, so the work is split across the engine's
//! [`rayon`] pool with no locking; each pass returns only once every pixel
//! has finished.

use std::time::Instant;

use log::{debug, trace};
use rayon::prelude::{
    IndexedParallelIterator, IntoParallelRefIterator, IntoParallelRefMutIterator, ParallelIterator,
};

use crate::{
    colour,
    config::{Config, ConfigError},
    grid::ComplexGrid,
    pixel::PixelState,
    screen,
    viewport::{PixelRect, Viewport},
};

pub struct EscapeEngine {
    config: Config,
    pool: rayon::ThreadPool,
    viewport: Viewport,
    budget: u32,
    iteration: u32,
    escaped: usize,
    pixels: Vec<PixelState>,
    colours: Vec<u32>,
}

impl EscapeEngine {
    pub fn new(config: Config, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|index| format!("escape-{}", index))
            .build()
            .map_err(|err| ConfigError::ThreadPool(err.to_string()))?;

        let len = config.size.len();
        let mut engine = Self {
            config,
            pool,
            viewport,
            budget: 1,
            iteration: 0,
            escaped: 0,
            pixels: vec![PixelState::new(num_complex::Complex::new(0.0, 0.0)); len],
            colours: vec![colour::BACKGROUND; len],
        };
        engine.reinit(viewport);
        Ok(engine)
    }

    pub fn size(&self) -> screen::Size {
        self.config.size
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Iterations run since the last [`reinit`](Self::reinit).
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// True once the budget is spent or every pixel has escaped.
    pub fn is_complete(&self) -> bool {
        self.iteration >= self.budget || self.escaped == self.pixels.len()
    }

    pub fn pixels(&self) -> &[PixelState] {
        &self.pixels
    }

    /// Packed `0x00RRGGBB` colours, row-major.
    pub fn colours(&self) -> &[u32] {
        &self.colours
    }

    pub fn diverged_count(&self) -> usize {
        self.pool.install(|| {
            self.pixels
                .par_iter()
                .filter(|pixel| pixel.has_diverged)
                .count()
        })
    }

    /// Resets every pixel to iterate a fresh `viewport`.
    pub fn reinit(&mut self, viewport: Viewport) {
        debug!("reinit to {:?}", viewport);

        let grid = ComplexGrid::new(&viewport, self.config.size);
        self.viewport = viewport;
        self.budget = self.config.budget.budget(viewport.width);
        self.iteration = 0;
        self.escaped = 0;

        let (pixels, colours) = (&mut self.pixels, &mut self.colours);
        self.pool.install(|| {
            pixels
                .par_iter_mut()
                .zip(colours.par_iter_mut())
                .enumerate()
                .for_each(|(index, (pixel, colour))| {
                    *pixel = PixelState::new(grid.point_at(index));
                    *colour = colour::BACKGROUND;
                })
        });

        debug!("iteration budget is {}", self.budget);
    }

    /// Runs up to `batch_size` more iterations on every pixel that hasn't
    /// escaped, never going past the budget. Returns how many pixels escaped
    /// during this call.
    ///
    /// Once [`is_complete`](Self::is_complete) this returns 0 and changes
    /// nothing, including the iteration count.
    pub fn advance(&mut self, batch_size: u32) -> usize {
        if self.is_complete() {
            return 0;
        }
        let steps = batch_size.min(self.budget - self.iteration);
        if steps == 0 {
            return 0;
        }

        trace!("begin advance {}..{}", self.iteration, self.iteration + steps);

        let first = self.iteration;
        let budget = self.budget;
        let radius_sqr = self.config.escape_radius * self.config.escape_radius;
        let (pixels, colours) = (&mut self.pixels, &mut self.colours);
        let escaped = self.pool.install(|| {
            pixels
                .par_iter_mut()
                .zip(colours.par_iter_mut())
                .filter(|(pixel, _)| !pixel.has_diverged)
                .filter_map(|(pixel, colour)| {
                    let escape = pixel.iterate(first, steps, radius_sqr)?;
                    let smoothed = colour::smooth_iteration(escape.iteration, escape.value);
                    *colour = colour::grey(smoothed, budget);
                    Some(())
                })
                .count()
        });
        self.iteration += steps;
        self.escaped += escaped;

        trace!("end advance, {} escaped", escaped);
        escaped
    }

    /// Advances in batches of the configured size until complete.
    /// Returns the number of pixels that escaped.
    pub fn run_to_completion(&mut self) -> usize {
        let start = Instant::now();
        let mut escaped = 0;
        while !self.is_complete() {
            escaped += self.advance(self.config.batch_size);
        }
        debug!(
            "{} iterations over {} pixels took {:?}",
            self.budget,
            self.pixels.len(),
            start.elapsed()
        );
        escaped
    }

    pub fn zoom_in(&mut self, rect: PixelRect) {
        let viewport = self.viewport.zoom_in(self.config.size, rect);
        self.reinit(viewport);
    }

    pub fn zoom_out(&mut self) {
        let viewport = self.viewport.zoom_out();
        self.reinit(viewport);
    }
}

#[cfg(test)]
mod tests {
    use num_complex::Complex;

    use super::*;
    use crate::config::BudgetPolicy;

    fn toy_config() -> Config {
        Config {
            size: screen::Size::new(4, 3),
            escape_radius: 1000.0,
            batch_size: 2,
            budget: BudgetPolicy {
                per_level: 5,
                max: 100,
            },
            threads: 2,
        }
    }

    fn toy_engine() -> EscapeEngine {
        EscapeEngine::new(toy_config(), Viewport::default()).unwrap()
    }

    #[test]
    fn reinit_resets_every_pixel() {
        let mut engine = toy_engine();
        engine.run_to_completion();
        assert!(engine.diverged_count() > 0);

        engine.reinit(Viewport::default());
        assert_eq!(engine.iteration(), 0);
        let grid = ComplexGrid::new(&Viewport::default(), engine.size());
        for (index, pixel) in engine.pixels().iter().enumerate() {
            assert!(!pixel.has_diverged);
            assert!(pixel.is_bounded_candidate);
            assert_eq!(pixel.current_value, Complex::new(0.0, 0.0));
            assert_eq!(pixel.constant, grid.point_at(index));
        }
        assert!(engine.colours().iter().all(|&c| c == colour::BACKGROUND));
    }

    #[test]
    fn advance_stops_at_budget() {
        let mut engine = toy_engine();
        assert_eq!(engine.budget(), 5);
        engine.advance(3);
        assert_eq!(engine.iteration(), 3);
        engine.advance(3);
        assert_eq!(engine.iteration(), 5);
        assert!(engine.is_complete());

        let pixels = engine.pixels().to_vec();
        let colours = engine.colours().to_vec();
        assert_eq!(engine.advance(10), 0);
        assert_eq!(engine.pixels(), &pixels[..]);
        assert_eq!(engine.colours(), &colours[..]);
    }

    #[test]
    fn divergence_is_monotonic() {
        let config = Config {
            size: screen::Size::new(64, 48),
            budget: BudgetPolicy {
                per_level: 40,
                max: 1000,
            },
            ..toy_config()
        };
        let mut engine = EscapeEngine::new(config, Viewport::default()).unwrap();
        let mut previous = vec![false; engine.pixels().len()];
        let mut total = 0;
        while !engine.is_complete() {
            total += engine.advance(3);
            for (was, pixel) in previous.iter_mut().zip(engine.pixels()) {
                assert!(!*was || pixel.has_diverged);
                *was = pixel.has_diverged;
            }
        }
        assert_eq!(total, engine.diverged_count());
    }

    #[test]
    fn all_escaped_view_is_idempotent() {
        // Far enough out that every pixel passes the radius on its second step.
        let viewport = Viewport::new(100.0, 100.0, 4.0, 3.0);
        let mut engine = EscapeEngine::new(toy_config(), viewport).unwrap();
        assert_eq!(engine.advance(2), 12);
        assert!(engine.budget() > 2);
        assert!(engine.is_complete());

        let pixels = engine.pixels().to_vec();
        let colours = engine.colours().to_vec();
        assert_eq!(engine.advance(2), 0);
        assert_eq!(engine.iteration(), 2);
        assert_eq!(engine.pixels(), &pixels[..]);
        assert_eq!(engine.colours(), &colours[..]);
    }

    #[test]
    fn run_to_completion_stops_early_when_everything_escapes() {
        let viewport = Viewport::new(100.0, 100.0, 4.0, 3.0);
        let mut engine = EscapeEngine::new(toy_config(), viewport).unwrap();
        assert_eq!(engine.run_to_completion(), 12);
        assert_eq!(engine.iteration(), 2);

        engine.reinit(viewport);
        assert!(!engine.is_complete());
        assert_eq!(engine.iteration(), 0);
    }

    #[test]
    fn origin_stays_bounded_and_far_point_escapes() {
        // Pixel (2, 2) sits on 0+0i and pixel (3, 3) on 2+2i.
        let config = Config {
            size: screen::Size::new(4, 4),
            ..toy_config()
        };
        let viewport = Viewport::new(-4.0, -4.0, 8.0, 8.0);
        let mut engine = EscapeEngine::new(config, viewport).unwrap();
        let size = engine.size();
        assert_eq!(engine.pixels()[size.index(2, 2)].constant, Complex::new(0.0, 0.0));
        assert_eq!(engine.pixels()[size.index(3, 3)].constant, Complex::new(2.0, 2.0));

        engine.advance(engine.budget());
        assert!(!engine.pixels()[size.index(2, 2)].has_diverged);
        assert_eq!(engine.colours()[size.index(2, 2)], colour::BACKGROUND);
        assert!(engine.pixels()[size.index(3, 3)].has_diverged);
    }

    #[test]
    fn thread_count_does_not_change_output() {
        let config = Config {
            size: screen::Size::new(40, 30),
            ..toy_config()
        };
        let viewport = Viewport::new(-2.0, -1.0, 2.5, 2.0);
        let mut single = EscapeEngine::new(Config { threads: 1, ..config.clone() }, viewport).unwrap();
        let mut many = EscapeEngine::new(Config { threads: 4, ..config }, viewport).unwrap();
        single.run_to_completion();
        many.run_to_completion();
        assert_eq!(single.colours(), many.colours());
    }

    #[test]
    fn zoom_replaces_viewport_and_resets() {
        let mut engine = toy_engine();
        engine.run_to_completion();
        engine.zoom_out();
        assert_eq!(engine.viewport(), Viewport::new(-5.0, -3.0, 8.0, 6.0));
        assert_eq!(engine.iteration(), 0);

        engine.zoom_in(PixelRect {
            x: 1,
            y: 0,
            width: 2,
            height: 3,
        });
        assert_eq!(engine.viewport(), Viewport::new(-3.0, -3.0, 4.0, 6.0));
        assert_eq!(engine.diverged_count(), 0);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = Config {
            batch_size: 0,
            ..toy_config()
        };
        assert!(matches!(
            EscapeEngine::new(config, Viewport::default()),
            Err(ConfigError::ZeroBatch)
        ));
    }
}
