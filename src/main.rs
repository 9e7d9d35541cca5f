//! Forecast Charts - Quarterly Forecast Comparison
//!
//! Loads (or fetches and caches) the forecast table, then shows the core
//! inflation and stock market comparison charts.

use anyhow::{Context, Result};
use forecast_charts::charts::{
    render_core_inflation_comparison, render_stock_market_comparison, PngViewer,
};
use forecast_charts::config::{self, Config};
use forecast_charts::data::ForecastProvider;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // Before the subscriber, so RUST_LOG may come from .env too.
    let env_file = Path::new(config::DEFAULT_ENV_FILE);
    let env_loaded = config::load_env_file(env_file);

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    if env_loaded {
        info!(path = %env_file.display(), "loaded environment file");
    }

    let config = Config::from_env();
    let cache_path = config.cache_path.clone();
    let mut viewer = PngViewer::new(&config.chart_dir);

    let provider = ForecastProvider::new(config).context("failed to build HTTP client")?;
    let dataset = provider
        .load_or_fetch(&cache_path)
        .with_context(|| format!("failed to load forecasts via {}", cache_path.display()))?;
    info!(rows = dataset.height(), columns = dataset.width(), "forecast dataset ready");

    render_core_inflation_comparison(&dataset, &mut viewer)
        .context("failed to render core inflation comparison")?;
    render_stock_market_comparison(&dataset, &mut viewer)
        .context("failed to render stock market comparison")?;

    Ok(())
}
