//! Chart Data Module
//! Turns the processed table into plot-ready series for the selected chart.

use crate::data::{format_number, DataLoader};
use polars::prelude::*;
use std::collections::HashMap;

/// Number of equal-width histogram bins.
pub const HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
    Scatter,
    Histogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Pie,
        ChartKind::Scatter,
        ChartKind::Histogram,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar Chart",
            ChartKind::Line => "Line Chart",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Histogram => "Histogram",
        }
    }
}

/// Chart kind plus the columns picked for the kinds that need them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSelection {
    pub kind: ChartKind,
    pub pie_column: Option<String>,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    pub histogram_column: Option<String>,
}

impl ChartSelection {
    /// Replace missing or stale picks with defaults from `numeric`.
    pub fn normalize(&mut self, numeric: &[String]) {
        fn pick(slot: &mut Option<String>, numeric: &[String], preferred: usize) {
            let valid = slot.as_ref().is_some_and(|c| numeric.contains(c));
            if !valid {
                *slot = numeric.get(preferred).or(numeric.first()).cloned();
            }
        }

        pick(&mut self.pie_column, numeric, 0);
        pick(&mut self.x_column, numeric, 0);
        pick(&mut self.y_column, numeric, 1);
        pick(&mut self.histogram_column, numeric, 0);
    }
}

/// One numeric column, indexed by row position.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    /// Start and end of the slice as fractions of the full circle.
    pub start: f64,
    pub end: f64,
}

impl PieSlice {
    pub fn fraction(&self) -> f64 {
        self.end - self.start
    }

    /// `%1.1f%%` label.
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.fraction() * 100.0)
    }

    /// Closed wedge outline (center first), counter-clockwise from 3 o'clock.
    pub fn polygon(&self, radius: f64) -> Vec<[f64; 2]> {
        let sweep = self.fraction() * std::f64::consts::TAU;
        let steps = ((self.fraction() * 128.0).ceil() as usize).max(2);
        let start = self.start * std::f64::consts::TAU;

        let mut points = Vec::with_capacity(steps + 2);
        points.push([0.0, 0.0]);
        for i in 0..=steps {
            let angle = start + sweep * i as f64 / steps as f64;
            points.push([radius * angle.cos(), radius * angle.sin()]);
        }
        points
    }

    /// Point in the middle of the wedge, `distance` from the center.
    pub fn label_anchor(&self, distance: f64) -> [f64; 2] {
        let angle = (self.start + self.fraction() / 2.0) * std::f64::consts::TAU;
        [distance * angle.cos(), distance * angle.sin()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Plot-ready data for one chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Bar(Vec<NumericSeries>),
    Line(Vec<NumericSeries>),
    Pie {
        column: String,
        slices: Vec<PieSlice>,
    },
    Scatter {
        x_label: String,
        y_label: String,
        points: Vec<[f64; 2]>,
    },
    Histogram {
        column: String,
        bins: Vec<HistogramBin>,
    },
}

/// Either something to draw or the warning to show instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Ready(ChartData),
    Warning(String),
}

impl ChartData {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartData::Bar(_) => ChartKind::Bar,
            ChartData::Line(_) => ChartKind::Line,
            ChartData::Pie { .. } => ChartKind::Pie,
            ChartData::Scatter { .. } => ChartKind::Scatter,
            ChartData::Histogram { .. } => ChartKind::Histogram,
        }
    }

    /// Build the selected chart over the numeric columns of `df`.
    pub fn prepare(df: &DataFrame, selection: &ChartSelection) -> ChartOutcome {
        match Self::try_prepare(df, selection) {
            Ok(outcome) => outcome,
            Err(e) => ChartOutcome::Warning(format!("⚠ Could not prepare chart: {e}")),
        }
    }

    fn try_prepare(df: &DataFrame, selection: &ChartSelection) -> PolarsResult<ChartOutcome> {
        let numeric = DataLoader::numeric_columns(df);

        let missing = match selection.kind {
            ChartKind::Scatter if numeric.len() < 2 => {
                Some("⚠ Not enough numeric columns for scatter plot.")
            }
            ChartKind::Bar if numeric.is_empty() => {
                Some("⚠ No numeric columns available for bar chart.")
            }
            ChartKind::Line if numeric.is_empty() => {
                Some("⚠ No numeric columns available for line chart.")
            }
            ChartKind::Pie if numeric.is_empty() => {
                Some("⚠ No numeric columns available for pie chart.")
            }
            ChartKind::Histogram if numeric.is_empty() => {
                Some("⚠ No numeric columns available for histogram.")
            }
            _ => None,
        };
        if let Some(message) = missing {
            return Ok(ChartOutcome::Warning(message.to_string()));
        }
        if df.height() == 0 {
            return Ok(ChartOutcome::Warning("⚠ No rows to plot.".to_string()));
        }

        // Fall back to the defaults when the selection was not normalized
        let mut selection = selection.clone();
        selection.normalize(&numeric);
        let column = |slot: &Option<String>| slot.clone().unwrap_or_default();

        let data = match selection.kind {
            ChartKind::Bar => ChartData::Bar(Self::all_series(df, &numeric)?),
            ChartKind::Line => ChartData::Line(Self::all_series(df, &numeric)?),
            ChartKind::Pie => {
                let name = column(&selection.pie_column);
                let values = Self::numeric_values(df, &name)?;
                ChartData::Pie {
                    slices: Self::pie_slices(&values),
                    column: name,
                }
            }
            ChartKind::Scatter => {
                let x_label = column(&selection.x_column);
                let y_label = column(&selection.y_column);
                let xs = Self::numeric_values(df, &x_label)?;
                let ys = Self::numeric_values(df, &y_label)?;
                let points = xs
                    .iter()
                    .zip(ys.iter())
                    .filter_map(|(x, y)| Some([(*x)?, (*y)?]))
                    .collect();
                ChartData::Scatter {
                    x_label,
                    y_label,
                    points,
                }
            }
            ChartKind::Histogram => {
                let name = column(&selection.histogram_column);
                let values: Vec<f64> = Self::numeric_values(df, &name)?
                    .into_iter()
                    .flatten()
                    .collect();
                ChartData::Histogram {
                    bins: Self::histogram_bins(&values, HISTOGRAM_BINS),
                    column: name,
                }
            }
        };

        Ok(ChartOutcome::Ready(data))
    }

    fn all_series(df: &DataFrame, numeric: &[String]) -> PolarsResult<Vec<NumericSeries>> {
        numeric
            .iter()
            .map(|name| {
                Ok(NumericSeries {
                    name: name.clone(),
                    values: Self::numeric_values(df, name)?,
                })
            })
            .collect()
    }

    /// Column cast to f64; NaN is treated as missing.
    fn numeric_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
        let series = df
            .column(column)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let values = series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|v| !v.is_nan()))
            .collect();
        Ok(values)
    }

    /// Value counts, most frequent first; ties keep first-appearance order.
    pub fn pie_slices(values: &[Option<f64>]) -> Vec<PieSlice> {
        let mut counts: Vec<(f64, usize)> = Vec::new();
        let mut index: HashMap<u64, usize> = HashMap::new();

        for value in values.iter().flatten() {
            // -0.0 and 0.0 are one value
            let value = if *value == 0.0 { 0.0 } else { *value };
            match index.get(&value.to_bits()) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    index.insert(value.to_bits(), counts.len());
                    counts.push((value, 1));
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let total: usize = counts.iter().map(|(_, c)| c).sum();
        let mut start = 0.0;
        counts
            .into_iter()
            .map(|(value, count)| {
                let end = start + count as f64 / total as f64;
                let slice = PieSlice {
                    label: format_number(value),
                    count,
                    start,
                    end,
                };
                start = end;
                slice
            })
            .collect()
    }

    /// Equal-width bins from min to max; the last bin includes max.
    pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
        if values.is_empty() || bins == 0 {
            return Vec::new();
        }

        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            min -= 0.5;
            max += 0.5;
        }
        let width = (max - min) / bins as f64;

        let mut counts = vec![0usize; bins];
        for value in values {
            let idx = (((value - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                start: min + width * i as f64,
                end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
                count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "label" => ["a", "b", "c", "d", "e"],
            "qty" => [Some(3i64), Some(1), Some(3), None, Some(2)],
            "price" => [1.0f64, 2.5, 4.0, 5.5, 7.0]
        )
        .unwrap()
    }

    fn select(kind: ChartKind) -> ChartSelection {
        ChartSelection {
            kind,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_defaults_and_repairs_stale_picks() {
        let numeric = vec!["qty".to_string(), "price".to_string()];
        let mut selection = ChartSelection {
            pie_column: Some("gone".to_string()),
            histogram_column: Some("price".to_string()),
            ..Default::default()
        };
        selection.normalize(&numeric);

        assert_eq!(selection.pie_column.as_deref(), Some("qty"));
        assert_eq!(selection.x_column.as_deref(), Some("qty"));
        assert_eq!(selection.y_column.as_deref(), Some("price"));
        assert_eq!(selection.histogram_column.as_deref(), Some("price"));
    }

    #[test]
    fn test_bar_chart_uses_numeric_columns_only() {
        let ChartOutcome::Ready(ChartData::Bar(series)) =
            ChartData::prepare(&frame(), &select(ChartKind::Bar))
        else {
            panic!("expected bar chart");
        };
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["qty", "price"]);
        assert_eq!(series[0].values[3], None);
    }

    #[test]
    fn test_pie_counts_values_most_frequent_first() {
        let ChartOutcome::Ready(ChartData::Pie { column, slices }) =
            ChartData::prepare(&frame(), &select(ChartKind::Pie))
        else {
            panic!("expected pie chart");
        };
        assert_eq!(column, "qty");
        let labels: Vec<&str> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["3", "1", "2"]);
        assert_eq!(slices[0].percent_label(), "50.0%");

        let total: f64 = slices.iter().map(PieSlice::fraction).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((slices.last().unwrap().end - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scatter_needs_two_numeric_columns() {
        let narrow = frame().select(["label", "price"]).unwrap();
        assert_eq!(
            ChartData::prepare(&narrow, &select(ChartKind::Scatter)),
            ChartOutcome::Warning("⚠ Not enough numeric columns for scatter plot.".to_string())
        );

        let ChartOutcome::Ready(ChartData::Scatter { points, .. }) =
            ChartData::prepare(&frame(), &select(ChartKind::Scatter))
        else {
            panic!("expected scatter plot");
        };
        // The row with a missing qty is skipped
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], [3.0, 1.0]);
    }

    #[test]
    fn test_warns_without_numeric_columns() {
        let text = frame().select(["label"]).unwrap();
        for kind in [ChartKind::Bar, ChartKind::Line, ChartKind::Pie, ChartKind::Histogram] {
            assert!(matches!(
                ChartData::prepare(&text, &select(kind)),
                ChartOutcome::Warning(_)
            ));
        }
    }

    #[test]
    fn test_warns_when_no_rows_left() {
        let empty = frame().head(Some(0));
        assert_eq!(
            ChartData::prepare(&empty, &select(ChartKind::Line)),
            ChartOutcome::Warning("⚠ No rows to plot.".to_string())
        );
    }

    #[test]
    fn test_histogram_bins_cover_every_value() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let bins = ChartData::histogram_bins(&values, HISTOGRAM_BINS);

        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[HISTOGRAM_BINS - 1].end, 100.0);
        // max lands in the last, closed bin
        assert_eq!(bins[HISTOGRAM_BINS - 1].count, 6);
    }

    #[test]
    fn test_histogram_of_constant_column() {
        let bins = ChartData::histogram_bins(&[4.0, 4.0, 4.0], 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(bins[0].start, 3.5);
        assert_eq!(bins[19].end, 4.5);
    }

    #[test]
    fn test_wedge_polygon_starts_at_center() {
        let slice = PieSlice {
            label: "x".to_string(),
            count: 1,
            start: 0.0,
            end: 0.25,
        };
        let points = slice.polygon(1.0);
        assert_eq!(points[0], [0.0, 0.0]);
        assert!((points[1][0] - 1.0).abs() < 1e-12);
        let last = points.last().unwrap();
        assert!(last[0].abs() < 1e-12 && (last[1] - 1.0).abs() < 1e-12);
    }
}
