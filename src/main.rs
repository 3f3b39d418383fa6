//! CTDC Report - batch analysis of trafficking case registrations
//!
//! Loads one CSV export, writes chart images and a JSON summary.

use anyhow::{Context, Result};
use clap::Parser;
use ctdc_report::cli::Cli;
use log::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = cli.resolve_config()?;
    let summary = ctdc_report::report::run(&cli.input, &cli.output, &config)
        .with_context(|| format!("report over {} failed", cli.input.display()))?;

    info!(
        "Done: {} rows, {} charts, slope {:.2} cases/year (p = {:.4})",
        summary.rows,
        summary.charts.len(),
        summary.trend.fit.slope,
        summary.trend.fit.p_value
    );
    Ok(())
}
