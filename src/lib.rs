//! Escape-time Mandelbrot renderer with rectangle zoom.
//!
//! A [`Viewport`] picks out a rectangle of the complex plane,
//! [`ComplexGrid`] maps each pixel onto it, and [`EscapeEngine`] iterates
//! `z <- z^2 + c` for every pixel in parallel, writing a grey level for each
//! one that escapes. [`SelectionOverlay`] turns pointer movement into the
//! rectangle to zoom into.

pub mod colour;
pub mod config;
pub mod engine;
pub mod grid;
pub mod pixel;
pub mod screen;
pub mod selection;
pub mod viewport;

pub use config::{BudgetPolicy, Config, ConfigError};
pub use engine::EscapeEngine;
pub use grid::ComplexGrid;
pub use selection::SelectionOverlay;
pub use viewport::{PixelRect, Viewport};
