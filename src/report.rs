//! Report Module
//! Runs the whole pipeline once: load, clean, aggregate, render, fit, summarise.

use crate::charts::{CategoryTrend, ChartRenderer, RenderMode, ScatterSeries};
use crate::config::{MissingGenderPolicy, ReportConfig};
use crate::data::{
    Aggregator, CaseLoader, CaseTable, DataProcessor, Field, GroupCounts, GroupKeys,
    SectorCounts, YearCount,
};
use crate::error::{ReportError, Result, Stage};
use crate::stats::{TrendEstimator, TrendFit};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "summary.json";

/// Every aggregated table the report draws or summarises.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub cases_by_year_gender: GroupCounts,
    pub age_band_by_year: GroupCounts,
    pub sectors: Vec<SectorCounts>,
    pub year_totals: Vec<YearCount>,
}

impl Aggregates {
    /// Compute all tables from a cleaned case table.
    pub fn compute(table: &CaseTable) -> Result<Self> {
        let cases_by_year_gender =
            Aggregator::group_count(table, GroupKeys::Pair(Field::Year, Field::Gender))?;
        let age_band_by_year =
            Aggregator::group_count(table, GroupKeys::Pair(Field::Year, Field::AgeBand))?;
        let sectors = Aggregator::sector_breakdown(table)?;
        let year_totals = Aggregator::year_totals(table)?;

        info!(
            "Aggregated {} year/gender groups, {} year/age groups, {} years",
            cases_by_year_gender.len(),
            age_band_by_year.len(),
            year_totals.len()
        );
        Ok(Self {
            cases_by_year_gender,
            age_band_by_year,
            sectors,
            year_totals,
        })
    }

    /// Bar charts drawn from these tables.
    pub fn bar_charts(&self) -> Vec<ChartJob<'_>> {
        let mut jobs = vec![
            ChartJob {
                file_name: "cases_by_year_gender.png".to_string(),
                title: "Registered cases by year and gender".to_string(),
                counts: &self.cases_by_year_gender,
                mode: RenderMode::StackedBar,
            },
            ChartJob {
                file_name: "gender_share_by_year.png".to_string(),
                title: "Gender share of cases by year".to_string(),
                counts: &self.cases_by_year_gender,
                mode: RenderMode::NormalizedBar,
            },
            ChartJob {
                file_name: "age_band_by_year.png".to_string(),
                title: "Age band share of cases by year".to_string(),
                counts: &self.age_band_by_year,
                mode: RenderMode::NormalizedBar,
            },
        ];
        jobs.extend(self.sectors.iter().map(|s| ChartJob {
            file_name: format!("labour_{}_by_gender.png", s.sector.slug()),
            title: format!("{} labour cases by gender", s.sector.label()),
            counts: &s.counts,
            mode: RenderMode::StackedBar,
        }));
        jobs
    }

    pub fn trend_chart(&self) -> ChartJob<'_> {
        ChartJob {
            file_name: "cases_trend_by_gender.png".to_string(),
            title: "Yearly cases by gender with linear trend".to_string(),
            counts: &self.cases_by_year_gender,
            mode: RenderMode::ScatterWithTrend,
        }
    }
}

/// One chart file to produce.
#[derive(Debug, Clone)]
pub struct ChartJob<'a> {
    pub file_name: String,
    pub title: String,
    pub counts: &'a GroupCounts,
    pub mode: RenderMode,
}

impl ChartJob<'_> {
    pub fn render(&self, renderer: &ChartRenderer, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(&self.file_name);
        renderer.render(&path, &self.title, self.counts, self.mode)?;
        Ok(path)
    }
}

/// Overall trend and the significance decision at the configured alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendReport {
    pub fit: TrendFit,
    pub significance: f64,
    pub significant: bool,
}

impl TrendReport {
    pub fn new(fit: TrendFit, significance: f64) -> Self {
        Self {
            fit,
            significance,
            significant: fit.is_significant(significance),
        }
    }
}

/// Everything one run produced; written as `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub rows: usize,
    pub sentinel_cells: usize,
    pub missing_gender: MissingGenderPolicy,
    pub aggregates: Aggregates,
    pub trend: TrendReport,
    pub gender_trends: Vec<CategoryTrend>,
    pub charts: Vec<PathBuf>,
}

/// Load, project and clean the input. Returns the cleaned table and the
/// number of sentinel cells that were recoded.
pub fn prepare(input: &Path, config: &ReportConfig) -> Result<(CaseTable, usize)> {
    let loaded = CaseLoader::load_delimited(input, config.separator_byte()?)?;
    let projected = DataProcessor::project(&loaded, &Field::ALL)?;
    let sentinel_cells = DataProcessor::sentinel_count(&projected)?;
    let cleaned = DataProcessor::clean(&projected)?;
    let resolved = DataProcessor::apply_gender_policy(&cleaned, config.missing_gender)?;
    Ok((resolved, sentinel_cells))
}

/// Fit the overall yearly trend.
pub fn fit_trend(aggregates: &Aggregates, significance: f64) -> Result<TrendReport> {
    let fit = TrendEstimator::fit(&aggregates.year_totals)?;
    let report = TrendReport::new(fit, significance);
    info!(
        "Trend: {:.2} cases/year (se {:.2}, p = {:.4}, R^2 = {:.3})",
        fit.slope, fit.slope_std_error, fit.p_value, fit.r_squared
    );
    if report.significant {
        info!("Slope is significant at alpha = {}", significance);
    } else {
        warn!("Slope is not significant at alpha = {}", significance);
    }
    Ok(report)
}

/// Run the full report over `input`, writing charts and the summary to `output_dir`.
///
/// Bar charts are written before the trend is fitted, so they remain valid
/// if the fit fails.
pub fn run(input: &Path, output_dir: &Path, config: &ReportConfig) -> Result<RunSummary> {
    config.validate()?;

    let (table, sentinel_cells) = prepare(input, config)?;
    let aggregates = Aggregates::compute(&table)?;

    fs::create_dir_all(output_dir).map_err(|source| ReportError::Io {
        stage: Stage::Report,
        path: output_dir.to_path_buf(),
        source,
    })?;

    let renderer = ChartRenderer::from_config(&config.chart);
    let mut charts = Vec::new();
    for job in aggregates.bar_charts() {
        charts.push(job.render(&renderer, output_dir)?);
    }
    info!("Wrote {} bar charts to {}", charts.len(), output_dir.display());

    let trend = fit_trend(&aggregates, config.significance)?;
    charts.push(aggregates.trend_chart().render(&renderer, output_dir)?);

    let gender_trends = ScatterSeries::from_counts(&aggregates.cases_by_year_gender).categories;

    let summary = RunSummary {
        input: input.to_path_buf(),
        rows: table.height(),
        sentinel_cells,
        missing_gender: config.missing_gender,
        aggregates,
        trend,
        gender_trends,
        charts,
    };

    if config.write_summary {
        let path = write_summary(&summary, output_dir)?;
        info!("Wrote summary to {}", path.display());
    }
    Ok(summary)
}

pub fn write_summary(summary: &RunSummary, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(SUMMARY_FILE);
    let io_error = |source| ReportError::Io {
        stage: Stage::Report,
        path: path.clone(),
        source,
    };
    let json = serde_json::to_string_pretty(summary).map_err(|e| io_error(std::io::Error::other(e)))?;
    fs::write(&path, json).map_err(io_error)?;
    Ok(path)
}
