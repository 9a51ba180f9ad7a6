//! Renders the default view without a window and reports how long it took.

use std::time::Instant;

use log::info;
use mandelbrot_zoom::{Config, EscapeEngine, Viewport};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    let batch_size = config.batch_size;
    let mut engine = EscapeEngine::new(config, Viewport::default())?;

    let start = Instant::now();
    let mut batches = 0;
    let mut escaped = 0;
    while !engine.is_complete() {
        let newly_escaped = engine.advance(batch_size);
        info!("batch {}: {} escaped", batches, newly_escaped);
        escaped += newly_escaped;
        batches += 1;
    }

    println!(
        "{} of {} pixels escaped within {} iterations",
        escaped,
        engine.pixels().len(),
        engine.budget()
    );
    println!("{}ms", start.elapsed().as_millis());
    Ok(())
}
