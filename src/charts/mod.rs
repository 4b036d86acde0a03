//! Charts module - Chart preparation and rendering

mod data;
mod plotter;
mod renderer;

pub use data::{
    ChartData, ChartKind, ChartOutcome, ChartSelection, HistogramBin, NumericSeries, PieSlice,
};
pub use plotter::ChartPlotter;
pub use renderer::StaticChartRenderer;
