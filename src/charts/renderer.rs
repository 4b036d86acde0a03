//! Static Chart Renderer
//! Saves the current chart as a PNG image with plotters.

use crate::charts::plotter::PALETTE;
use crate::charts::{ChartData, HistogramBin, NumericSeries, PieSlice};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Output image size in pixels.
pub const PNG_SIZE: (u32, u32) = (1200, 800);

const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn palette(index: usize) -> RGBColor {
    let color = PALETTE[index % PALETTE.len()];
    RGBColor(color.r(), color.g(), color.b())
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    pub fn render_png(data: &ChartData, title: &str, path: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, PNG_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        match data {
            ChartData::Bar(series) => Self::render_bars(&root, title, series)?,
            ChartData::Line(series) => Self::render_lines(&root, title, series)?,
            ChartData::Pie { column, slices } => {
                Self::render_pie(&root, &format!("{title}: {column}"), slices)?
            }
            ChartData::Scatter {
                x_label,
                y_label,
                points,
            } => Self::render_scatter(&root, title, x_label, y_label, points)?,
            ChartData::Histogram { column, bins } => {
                Self::render_histogram(&root, title, column, bins)?
            }
        }

        root.present().map_err(draw_err)?;
        log::info!("Saved {} to {}", data.kind().label(), path.display());
        Ok(())
    }

    /// Axis range spanning `values` with 5% headroom, always including 0
    /// when `from_zero` is set.
    fn padded_range(values: impl Iterator<Item = f64>, from_zero: bool) -> Range<f64> {
        let (mut min, mut max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            return 0.0..1.0;
        }
        if from_zero {
            min = min.min(0.0);
            max = max.max(0.0);
        }
        if min == max {
            return (min - 0.5)..(max + 0.5);
        }
        let pad = (max - min) * 0.05;
        let lower = if from_zero && min == 0.0 { 0.0 } else { min - pad };
        let upper = if from_zero && max == 0.0 { 0.0 } else { max + pad };
        lower..upper
    }

    fn series_values(series: &[NumericSeries]) -> impl Iterator<Item = f64> + '_ {
        series.iter().flat_map(|s| s.values.iter().flatten().copied())
    }

    fn row_count(series: &[NumericSeries]) -> usize {
        series.iter().map(|s| s.values.len()).max().unwrap_or(0)
    }

    fn render_bars(
        root: &Area<'_>,
        title: &str,
        series: &[NumericSeries],
    ) -> Result<(), RenderError> {
        let rows = Self::row_count(series).max(1);
        let y_range = Self::padded_range(Self::series_values(series), true);

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5..(rows as f64 - 0.5), y_range)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Row")
            .draw()
            .map_err(draw_err)?;

        let group_width = 0.8;
        let bar_width = group_width / series.len().max(1) as f64;
        for (i, s) in series.iter().enumerate() {
            let color = palette(i);
            let offset = -group_width / 2.0 + bar_width * i as f64;
            chart
                .draw_series(s.values.iter().enumerate().filter_map(|(row, v)| {
                    let x0 = row as f64 + offset;
                    v.map(|v| Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], color.filled()))
                }))
                .map_err(draw_err)?
                .label(s.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        Self::draw_legend(&mut chart)
    }

    fn render_lines(
        root: &Area<'_>,
        title: &str,
        series: &[NumericSeries],
    ) -> Result<(), RenderError> {
        let rows = Self::row_count(series).max(2);
        let y_range = Self::padded_range(Self::series_values(series), false);

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..(rows as f64 - 1.0), y_range)
            .map_err(draw_err)?;
        chart.configure_mesh().x_desc("Row").draw().map_err(draw_err)?;

        for (i, s) in series.iter().enumerate() {
            let color = palette(i);
            let points: Vec<(f64, f64)> = s
                .values
                .iter()
                .enumerate()
                .filter_map(|(row, v)| v.map(|v| (row as f64, v)))
                .collect();

            // One legend entry per column; gaps split the line
            let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
            for &(x, y) in &points {
                match runs.last_mut() {
                    Some(run) if run.last().is_some_and(|&(px, _)| x - px == 1.0) => {
                        run.push((x, y))
                    }
                    _ => runs.push(vec![(x, y)]),
                }
            }

            for (n, run) in runs.into_iter().enumerate() {
                let drawn = chart
                    .draw_series(LineSeries::new(run, color.stroke_width(2)))
                    .map_err(draw_err)?;
                if n == 0 {
                    drawn.label(s.name.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
            }
        }

        Self::draw_legend(&mut chart)
    }

    fn render_pie(root: &Area<'_>, title: &str, slices: &[PieSlice]) -> Result<(), RenderError> {
        let (width, height) = PNG_SIZE;
        let aspect = width as f64 / height as f64;

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .build_cartesian_2d(-1.2 * aspect..1.2 * aspect, -1.2..1.2)
            .map_err(draw_err)?;

        for (i, slice) in slices.iter().enumerate() {
            let color = palette(i);
            let outline: Vec<(f64, f64)> =
                slice.polygon(1.0).into_iter().map(|[x, y]| (x, y)).collect();
            chart
                .draw_series(std::iter::once(Polygon::new(outline, color.filled())))
                .map_err(draw_err)?
                .label(slice.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

            let [x, y] = slice.label_anchor(0.6);
            chart
                .draw_series(std::iter::once(Text::new(
                    slice.percent_label(),
                    (x, y),
                    (FONT, 18).into_font().color(&WHITE),
                )))
                .map_err(draw_err)?;
        }

        Self::draw_legend(&mut chart)
    }

    fn render_scatter(
        root: &Area<'_>,
        title: &str,
        x_label: &str,
        y_label: &str,
        points: &[[f64; 2]],
    ) -> Result<(), RenderError> {
        let x_range = Self::padded_range(points.iter().map(|p| p[0]), false);
        let y_range = Self::padded_range(points.iter().map(|p| p[1]), false);

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .map_err(draw_err)?;

        let color = palette(0);
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&[x, y]| Circle::new((x, y), 4, color.filled())),
            )
            .map_err(draw_err)?;
        Ok(())
    }

    fn render_histogram(
        root: &Area<'_>,
        title: &str,
        column: &str,
        bins: &[HistogramBin],
    ) -> Result<(), RenderError> {
        let x_range = match (bins.first(), bins.last()) {
            (Some(first), Some(last)) => first.start..last.end,
            _ => 0.0..1.0,
        };
        let y_range = Self::padded_range(bins.iter().map(|b| b.count as f64), true);

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(column)
            .y_desc("Frequency")
            .draw()
            .map_err(draw_err)?;

        let color = palette(0);
        chart
            .draw_series(bins.iter().map(|bin| {
                Rectangle::new([(bin.start, 0.0), (bin.end, bin.count as f64)], color.filled())
            }))
            .map_err(draw_err)?;
        chart
            .draw_series(bins.iter().map(|bin| {
                Rectangle::new(
                    [(bin.start, 0.0), (bin.end, bin.count as f64)],
                    BLACK.stroke_width(1),
                )
            }))
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_legend<'a, DB: DrawingBackend + 'a>(
        chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    ) -> Result<(), RenderError> {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range_includes_zero_for_bars() {
        let range = StaticChartRenderer::padded_range([3.0, 10.0].into_iter(), true);
        assert_eq!(range.start, 0.0);
        assert!(range.end > 10.0);
    }

    #[test]
    fn test_padded_range_handles_degenerate_input() {
        assert_eq!(
            StaticChartRenderer::padded_range(std::iter::empty(), false),
            0.0..1.0
        );
        assert_eq!(
            StaticChartRenderer::padded_range([2.0, 2.0].into_iter(), false),
            1.5..2.5
        );
        let range = StaticChartRenderer::padded_range([f64::NAN, 1.0, 3.0].into_iter(), false);
        assert!((range.start - 0.9).abs() < 1e-12);
        assert!((range.end - 3.1).abs() < 1e-12);
    }

    #[test]
    fn test_render_line_chart_with_legend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv_chart.png");
        let data = ChartData::Line(vec![
            NumericSeries {
                name: "price".to_string(),
                values: vec![Some(1.0), None, Some(3.0), Some(2.5)],
            },
            NumericSeries {
                name: "qty".to_string(),
                values: vec![Some(4.0), Some(5.0), Some(6.0), None],
            },
        ]);

        match StaticChartRenderer::render_png(&data, "sales.csv - Line Chart", &path) {
            Ok(()) => {
                let written = std::fs::metadata(&path).unwrap();
                assert!(written.len() > 0);
            }
            // Machines without any system font cannot draw text
            Err(RenderError::Draw(msg)) => assert!(msg.to_lowercase().contains("font"), "{msg}"),
        }
    }
}
