//! Charts module - Chart rendering

mod renderer;
mod series;

pub use renderer::{ChartRenderer, RenderMode, PALETTE};
pub use series::{BarSeries, CategoryTrend, ScatterSeries, SINGLE_CATEGORY};
