//! Air Quality Dashboard - startup shell
//!
//! Loads the station dataset once and hands the built views to the
//! presentation layer as JSON on stdout.

use airq_dashboard::{DashboardConfig, DashboardData, DatasetCache, JsonPresenter, Presenter};
use anyhow::Context;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::default();
    let cache = DatasetCache::global();

    let dataset = cache
        .get_or_load()
        .with_context(|| format!("starting dashboard from {}", cache.source().display()))?;
    let data = DashboardData::build(dataset, &config).context("building dashboard views")?;

    let stdout = std::io::stdout();
    JsonPresenter::new(stdout.lock()).render(&data)?;
    Ok(())
}
