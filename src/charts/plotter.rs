//! Chart Plotter Module
//! Draws prepared chart data with egui_plot.

use crate::charts::{ChartData, NumericSeries, PieSlice};
use egui::{Color32, RichText, Stroke};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(52, 152, 219),  // Blue
    Color32::from_rgb(231, 76, 60),   // Red
    Color32::from_rgb(46, 204, 113),  // Green
    Color32::from_rgb(155, 89, 182),  // Purple
    Color32::from_rgb(243, 156, 18),  // Orange
    Color32::from_rgb(26, 188, 156),  // Teal
    Color32::from_rgb(233, 30, 99),   // Pink
    Color32::from_rgb(0, 188, 212),   // Cyan
    Color32::from_rgb(255, 87, 34),   // Deep Orange
    Color32::from_rgb(96, 125, 139),  // Blue Grey
];

const PLOT_HEIGHT: f32 = 360.0;

/// Interactive chart widgets.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn series_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Draw one chart. `id` keeps plots of different datasets apart.
    pub fn draw(ui: &mut egui::Ui, id: impl std::hash::Hash, data: &ChartData) {
        let plot_id = ui.make_persistent_id(id);
        match data {
            ChartData::Bar(series) => Self::draw_bar_chart(ui, plot_id, series),
            ChartData::Line(series) => Self::draw_line_chart(ui, plot_id, series),
            ChartData::Pie { column, slices } => Self::draw_pie_chart(ui, plot_id, column, slices),
            ChartData::Scatter {
                x_label,
                y_label,
                points,
            } => Self::draw_scatter_plot(ui, plot_id, x_label, y_label, points),
            ChartData::Histogram { column, bins } => {
                let bars = bins
                    .iter()
                    .map(|bin| {
                        let width = bin.end - bin.start;
                        Bar::new(bin.start + width / 2.0, bin.count as f64)
                            .width(width)
                            .stroke(Stroke::new(1.0, Color32::BLACK))
                    })
                    .collect();

                Plot::new(plot_id)
                    .height(PLOT_HEIGHT)
                    .x_axis_label(column.clone())
                    .y_axis_label("Frequency")
                    .allow_scroll(false)
                    .show(ui, |plot_ui| {
                        plot_ui.bar_chart(BarChart::new(bars).color(PALETTE[0]).name(column));
                    });
            }
        }
    }

    /// Grouped bars, one group per row and one bar per column.
    fn draw_bar_chart(ui: &mut egui::Ui, plot_id: egui::Id, series: &[NumericSeries]) {
        let group_width = 0.8;
        let bar_width = group_width / series.len().max(1) as f64;

        Plot::new(plot_id)
            .height(PLOT_HEIGHT)
            .legend(Legend::default())
            .x_axis_label("Row")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (i, s) in series.iter().enumerate() {
                    let offset = -group_width / 2.0 + bar_width * (i as f64 + 0.5);
                    let bars = s
                        .values
                        .iter()
                        .enumerate()
                        .filter_map(|(row, v)| {
                            v.map(|v| Bar::new(row as f64 + offset, v).width(bar_width))
                        })
                        .collect();
                    plot_ui.bar_chart(
                        BarChart::new(bars)
                            .color(Self::series_color(i))
                            .name(&s.name),
                    );
                }
            });
    }

    fn draw_line_chart(ui: &mut egui::Ui, plot_id: egui::Id, series: &[NumericSeries]) {
        Plot::new(plot_id)
            .height(PLOT_HEIGHT)
            .legend(Legend::default())
            .x_axis_label("Row")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (i, s) in series.iter().enumerate() {
                    // Missing values break the line
                    for run in Self::runs(&s.values) {
                        plot_ui.line(
                            Line::new(PlotPoints::from(run))
                                .color(Self::series_color(i))
                                .width(1.5)
                                .name(&s.name),
                        );
                    }
                }
            });
    }

    /// Consecutive non-missing points as separate segments.
    fn runs(values: &[Option<f64>]) -> Vec<Vec<[f64; 2]>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for (row, value) in values.iter().enumerate() {
            match value {
                Some(v) => current.push([row as f64, *v]),
                None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    fn draw_pie_chart(ui: &mut egui::Ui, plot_id: egui::Id, column: &str, slices: &[PieSlice]) {
        ui.label(RichText::new(column).strong());
        Plot::new(plot_id)
            .height(PLOT_HEIGHT)
            .data_aspect(1.0)
            .legend(Legend::default())
            .show_axes(false)
            .show_grid(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (i, slice) in slices.iter().enumerate() {
                    let color = Self::series_color(i);
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(slice.polygon(1.0)))
                            .fill_color(color.gamma_multiply(0.85))
                            .stroke(Stroke::new(1.0, Color32::WHITE))
                            .name(&slice.label),
                    );

                    let [x, y] = slice.label_anchor(0.6);
                    plot_ui.text(Text::new(
                        PlotPoint::new(x, y),
                        RichText::new(slice.percent_label()).color(Color32::WHITE),
                    ));
                }
            });
    }

    fn draw_scatter_plot(
        ui: &mut egui::Ui,
        plot_id: egui::Id,
        x_label: &str,
        y_label: &str,
        points: &[[f64; 2]],
    ) {
        Plot::new(plot_id)
            .height(PLOT_HEIGHT)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(PlotPoints::from(points.to_vec()))
                        .radius(3.0)
                        .color(PALETTE[0])
                        .name(format!("{} vs {}", y_label, x_label)),
                );
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_runs_split_on_missing_values() {
        let runs = ChartPlotter::runs(&[Some(1.0), Some(2.0), None, None, Some(5.0)]);
        assert_eq!(runs, vec![vec![[0.0, 1.0], [1.0, 2.0]], vec![[4.0, 5.0]]]);
        assert!(ChartPlotter::runs(&[None]).is_empty());
    }

    #[test]
    fn test_series_color_wraps_palette() {
        assert_eq!(ChartPlotter::series_color(0), ChartPlotter::series_color(PALETTE.len()));
    }
}
