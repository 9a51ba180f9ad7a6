//! Engine configuration.
//!
//! Grid dimensions, escape radius and the iteration budget policy are
//! passed to [`EscapeEngine::new`](crate::engine::EscapeEngine::new) rather
//! than living in globals, so several engines of different sizes can coexist.

use std::{env, fmt};

use crate::screen;

/// Number of worker threads, overriding [`num_cpus::get`].
pub const THREADS_VAR: &str = "MANDELBROT_THREADS";

/// Iterations per [`advance`](crate::engine::EscapeEngine::advance) call.
pub const BATCH_VAR: &str = "MANDELBROT_BATCH";

/// Maps a viewport width to an iteration budget.
///
/// `budget = per_level * max(1, round(2 - log2(width)))`, capped at `max`.
/// Narrower viewports (deeper zoom) get more iterations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetPolicy {
    pub per_level: u32,
    pub max: u32,
}

impl BudgetPolicy {
    pub fn budget(&self, width: f64) -> u32 {
        let levels = (2.0 - width.log2()).round();
        // NaN and negative levels both fall back to a single level.
        let levels = if levels >= 1.0 {
            levels.min(u32::MAX as f64) as u32
        } else {
            1
        };
        self.per_level
            .max(1)
            .saturating_mul(levels)
            .min(self.max.max(1))
    }
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            per_level: 30,
            max: 3000,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub size: screen::Size,
    pub escape_radius: f64,
    pub batch_size: u32,
    pub budget: BudgetPolicy,
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size: screen::Size::new(1024, 768),
            escape_radius: 1000.0,
            batch_size: 100,
            budget: BudgetPolicy::default(),
            threads: num_cpus::get(),
        }
    }
}

impl Config {
    /// The defaults, with [`THREADS_VAR`] and [`BATCH_VAR`] applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// The defaults, with overrides read through `lookup` instead of the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(threads) = read_var(THREADS_VAR, lookup(THREADS_VAR))? {
            config.threads = threads;
        }
        if let Some(batch_size) = read_var(BATCH_VAR, lookup(BATCH_VAR))? {
            config.batch_size = batch_size;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size.is_empty() {
            return Err(ConfigError::EmptyGrid(self.size));
        }
        if !self.escape_radius.is_finite() || self.escape_radius <= 0.0 {
            return Err(ConfigError::EscapeRadius(self.escape_radius));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }
}

fn read_var<A: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<A>, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Var { name, value }),
        None => Ok(None),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    EmptyGrid(screen::Size),
    EscapeRadius(f64),
    ZeroBatch,
    ZeroThreads,
    Var { name: &'static str, value: String },
    ThreadPool(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyGrid(size) => {
                write!(f, "pixel grid {}x{} is empty", size.width, size.height)
            }
            ConfigError::EscapeRadius(radius) => {
                write!(f, "escape radius must be finite and positive, got {}", radius)
            }
            ConfigError::ZeroBatch => write!(f, "batch size must be at least 1"),
            ConfigError::ZeroThreads => write!(f, "thread count must be at least 1"),
            ConfigError::Var { name, value } => write!(f, "invalid value for {}: {:?}", name, value),
            ConfigError::ThreadPool(message) => write!(f, "failed to build thread pool: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}
