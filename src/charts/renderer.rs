//! Static Chart Renderer
//! Draws bar and scatter charts to PNG files with plotters.
//!
//! Layout of every chart:
//! 1. Title centered at the top
//! 2. Plot area with axis descriptions
//! 3. Legend box over the plot area

use crate::charts::series::{BarSeries, ScatterSeries};
use crate::config::ChartConfig;
use crate::data::{Field, GroupCounts};
use crate::error::{ReportError, Result, Stage};
use log::debug;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Color palette for categories
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// How an aggregated table is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Raw counts, categories stacked within each bucket.
    StackedBar,
    /// Shares of each bucket's total, stacked to 1.
    NormalizedBar,
    /// One point per year and category, with a fitted line per category.
    ScatterWithTrend,
}

pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl ChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn from_config(config: &ChartConfig) -> Self {
        Self::new(config.width, config.height)
    }

    /// Render `counts` to a PNG at `path`.
    pub fn render(
        &self,
        path: &Path,
        title: &str,
        counts: &GroupCounts,
        mode: RenderMode,
    ) -> Result<()> {
        debug!("Rendering {:?} chart to {}", mode, path.display());
        let outcome = match mode {
            RenderMode::StackedBar => {
                self.draw_bars(path, title, &BarSeries::from_counts(counts), "Cases")
            }
            RenderMode::NormalizedBar => self.draw_bars(
                path,
                title,
                &BarSeries::from_counts(counts).normalized(),
                "Share of cases",
            ),
            RenderMode::ScatterWithTrend => {
                self.draw_scatter(path, title, &ScatterSeries::from_counts(counts))
            }
        };
        outcome.map_err(|e| ReportError::Render {
            stage: Stage::Render,
            chart: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn draw_bars(&self, path: &Path, title: &str, series: &BarSeries, y_desc: &str) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let bucket_count = series.buckets.len().max(1) as u32;
        let tallest = series.max_stack();
        let y_max = if tallest > 0.0 { tallest * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..bucket_count).into_segmented(), 0f64..y_max)?;

        let labels: Vec<String> = series.buckets.iter().map(|b| b.to_string()).collect();
        let x_desc = series
            .bucket_field
            .map(|f| f.to_string())
            .unwrap_or_default();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        // Running top of each stack
        let mut base = vec![0.0; series.buckets.len()];
        for (c, category) in series.categories.iter().enumerate() {
            let color = PALETTE[c % PALETTE.len()];
            let mut bars = Vec::new();
            for (b, row) in series.values.iter().enumerate() {
                let value = row[c];
                let bottom = base[b];
                base[b] += value;
                // Zero-height segments are skipped
                if value > 0.0 {
                    let mut bar = Rectangle::new(
                        [
                            (SegmentValue::Exact(b as u32), bottom),
                            (SegmentValue::Exact(b as u32 + 1), base[b]),
                        ],
                        color.filled(),
                    );
                    bar.set_margin(0, 0, 6, 6);
                    bars.push(bar);
                }
            }
            chart
                .draw_series(bars)?
                .label(category.to_string())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_scatter(&self, path: &Path, title: &str, series: &ScatterSeries) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (first, last) = series.year_range().unwrap_or((0, 1));
        let x_min = first as f64 - 0.5;
        let x_max = last as f64 + 0.5;
        let y_max = (series.max_count() as f64 * 1.1).max(1.0);

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_desc(Field::Year.name())
            .y_desc("Cases")
            .x_labels(((last - first) as usize + 1).min(20))
            .x_label_formatter(&|x| format!("{:.0}", x))
            .draw()?;

        for (i, trend) in series.categories.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            chart
                .draw_series(trend.points.iter().map(|p| {
                    Circle::new((p.year as f64, p.count as f64), 4, color.filled())
                }))?
                .label(trend.category.to_string())
                .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));

            if let Some(fit) = trend.fit {
                let start = trend.points.iter().map(|p| p.year).min().unwrap_or(first) as f64;
                let end = trend.points.iter().map(|p| p.year).max().unwrap_or(last) as f64;
                let line = [start, end].map(|x| (x, fit.predict(x)));
                chart.draw_series(LineSeries::new(line, color.stroke_width(2)))?;
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}
