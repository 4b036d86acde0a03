//! Dataset View Widget
//! One uploaded file: preview, cleaning, sort, summary, columns, search,
//! chart and download controls.

use crate::charts::{ChartKind, ChartOutcome, ChartPlotter};
use crate::data::{format_number, Dataset, ExportFormat, Notice, SortOrder, ViewState};
use crate::gui::theme;
use crate::stats::{CategoricalSummary, NumericSummary, Summary};
use egui::{ComboBox, RichText, ScrollArea};
use polars::prelude::*;

/// Rows shown in the preview grids.
pub const PREVIEW_ROWS: usize = 10;

/// Actions that need the application (file dialogs, disk I/O).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatasetAction {
    None,
    Download,
    SaveChart,
}

enum Cleaning {
    None,
    RemoveDuplicates,
    FillMissing,
}

pub struct DatasetView;

impl DatasetView {
    /// Draw one dataset. Widget edits land in a copy of the view state and
    /// are applied after drawing; the caches catch up on the next frame.
    pub fn show(ui: &mut egui::Ui, dataset: &mut Dataset) -> DatasetAction {
        dataset.refresh();

        let mut view = dataset.view.clone();
        let mut cleaning = Cleaning::None;
        let mut action = DatasetAction::None;
        let id = dataset.id;

        // ===== Preview =====
        Self::heading(ui, &format!("📊 Preview: {}", dataset.name));
        let (rows, cols) = dataset.frame().shape();
        ui.label(RichText::new(format!("{rows} rows × {cols} columns")).size(11.0).weak());
        Self::table_grid(ui, (id, "preview"), dataset.frame(), PREVIEW_ROWS);

        // ===== Cleaning =====
        Self::heading(ui, "🧹 Data Cleaning");
        ui.horizontal(|ui| {
            if theme::action_button(ui, "🗑 Remove Duplicates").clicked() {
                cleaning = Cleaning::RemoveDuplicates;
            }
            if theme::action_button(ui, "🔄 Fill Missing Values").clicked() {
                cleaning = Cleaning::FillMissing;
            }
        });
        match &dataset.notice {
            Some(Notice::Success(text)) => {
                ui.label(RichText::new(text).color(theme::SUCCESS));
            }
            Some(Notice::Error(text)) => {
                ui.label(RichText::new(text).color(theme::ERROR));
            }
            None => {}
        }

        // ===== Sort =====
        Self::heading(ui, "🔃 Sort Data");
        let columns = dataset.column_names();
        ui.horizontal(|ui| {
            ui.label("Sort by:");
            ComboBox::from_id_salt((id, "sort_column"))
                .width(180.0)
                .selected_text(view.pipeline.sort_column.clone().unwrap_or_default())
                .show_ui(ui, |ui| {
                    for col in &columns {
                        ui.selectable_value(
                            &mut view.pipeline.sort_column,
                            Some(col.clone()),
                            col,
                        );
                    }
                });
            ui.radio_value(&mut view.pipeline.sort_order, SortOrder::Ascending, "Ascending");
            ui.radio_value(&mut view.pipeline.sort_order, SortOrder::Descending, "Descending");
        });

        let processed = dataset.processed();

        // ===== Summary =====
        Self::heading(ui, "📊 Data Summary");
        match processed {
            Some(Ok(processed)) => Self::summary_grid(ui, (id, "summary"), &processed.summary),
            Some(Err(e)) => {
                ui.label(RichText::new(format!("❌ {e}")).color(theme::ERROR));
            }
            None => {}
        }

        // ===== Column Selection =====
        Self::heading(ui, "🎯 Select Columns");
        Self::column_picker(ui, &columns, &mut view);

        // ===== Search =====
        Self::heading(ui, "🔍 Search Data");
        ui.add(
            egui::TextEdit::singleline(&mut view.pipeline.search)
                .hint_text(format!("Search in {}", dataset.name))
                .desired_width(320.0),
        );
        if let Some(Ok(processed)) = processed {
            ui.label(
                RichText::new(format!(
                    "{} of {} rows match",
                    processed.frame.height(),
                    dataset.frame().height()
                ))
                .size(11.0)
                .weak(),
            );
            Self::table_grid(ui, (id, "processed"), &processed.frame, PREVIEW_ROWS);
        }

        // ===== Visualization =====
        Self::heading(ui, "📈 Data Visualization");
        let numeric = match processed {
            Some(Ok(processed)) => processed.numeric_columns.clone(),
            _ => Vec::new(),
        };
        Self::chart_controls(ui, id, &numeric, &mut view);

        match dataset.chart() {
            Some(ChartOutcome::Ready(data)) if data.kind() == view.chart.kind => {
                ChartPlotter::draw(ui, (id, "chart"), data);
                if ui.button("🖼 Save Chart as PNG").clicked() {
                    action = DatasetAction::SaveChart;
                }
            }
            Some(ChartOutcome::Warning(text)) => {
                ui.label(RichText::new(text).color(theme::WARNING));
            }
            _ => {
                ui.spinner();
            }
        }

        // ===== Download =====
        Self::heading(ui, "💾 Download Processed Data");
        ui.horizontal(|ui| {
            ui.label(format!("Convert {} to:", dataset.name));
            for format in ExportFormat::ALL {
                ui.radio_value(&mut view.export_format, format, format.label());
            }
        });
        ui.add_enabled_ui(matches!(processed, Some(Ok(_))), |ui| {
            let label = format!("⬇️ Download {}", view.export_format.label());
            if theme::download_button(ui, &label).clicked() {
                action = DatasetAction::Download;
            }
        });

        match cleaning {
            Cleaning::RemoveDuplicates => dataset.remove_duplicates(),
            Cleaning::FillMissing => dataset.fill_missing(),
            Cleaning::None => {}
        }
        if view != dataset.view {
            dataset.view = view;
            ui.ctx().request_repaint();
        }

        action
    }

    fn heading(ui: &mut egui::Ui, text: &str) {
        ui.add_space(12.0);
        ui.label(RichText::new(text).size(18.0).strong());
        ui.add_space(4.0);
    }

    fn column_picker(ui: &mut egui::Ui, columns: &[String], view: &mut ViewState) {
        let selected = &mut view.pipeline.columns;
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                *selected = columns.to_vec();
            }
            if ui.small_button("Clear All").clicked() {
                selected.clear();
            }
        });

        ui.horizontal_wrapped(|ui| {
            for col in columns {
                let mut checked = selected.contains(col);
                if ui.checkbox(&mut checked, col).changed() {
                    if checked {
                        selected.push(col.clone());
                    } else {
                        selected.retain(|c| c != col);
                    }
                }
            }
        });
    }

    fn chart_controls(ui: &mut egui::Ui, id: u64, numeric: &[String], view: &mut ViewState) {
        let chart = &mut view.chart;

        ComboBox::from_id_salt((id, "chart_kind"))
            .width(180.0)
            .selected_text(chart.kind.label())
            .show_ui(ui, |ui| {
                for kind in ChartKind::ALL {
                    ui.selectable_value(&mut chart.kind, kind, kind.label());
                }
            });

        let picker = |ui: &mut egui::Ui, label: &str, salt: &str, slot: &mut Option<String>| {
            ui.horizontal(|ui| {
                ui.label(label);
                ComboBox::from_id_salt((id, salt))
                    .width(180.0)
                    .selected_text(slot.clone().unwrap_or_default())
                    .show_ui(ui, |ui| {
                        for col in numeric {
                            ui.selectable_value(slot, Some(col.clone()), col);
                        }
                    });
            });
        };

        match chart.kind {
            ChartKind::Pie if !numeric.is_empty() => {
                picker(ui, "Select column for Pie Chart", "pie", &mut chart.pie_column);
            }
            ChartKind::Scatter if numeric.len() > 1 => {
                picker(ui, "Select X-axis column", "scatter_x", &mut chart.x_column);
                picker(ui, "Select Y-axis column", "scatter_y", &mut chart.y_column);
            }
            ChartKind::Histogram if !numeric.is_empty() => {
                picker(
                    ui,
                    "Select column for Histogram",
                    "histogram",
                    &mut chart.histogram_column,
                );
            }
            _ => {}
        }
    }

    /// Striped grid of the first `max_rows` rows.
    fn table_grid(ui: &mut egui::Ui, salt: impl std::hash::Hash, df: &DataFrame, max_rows: usize) {
        if df.width() == 0 {
            ui.label(RichText::new("No columns selected").weak());
            return;
        }

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ScrollArea::horizontal().id_salt(&salt).show(ui, |ui| {
                    egui::Grid::new(salt)
                        .striped(true)
                        .min_col_width(60.0)
                        .spacing([12.0, 4.0])
                        .show(ui, |ui| {
                            for column in df.get_columns() {
                                ui.label(RichText::new(column.name().as_str()).strong().size(12.0));
                            }
                            ui.end_row();

                            for row in 0..df.height().min(max_rows) {
                                for column in df.get_columns() {
                                    let text = column
                                        .get(row)
                                        .map(|v| Self::format_cell(&v))
                                        .unwrap_or_default();
                                    ui.label(RichText::new(text).size(12.0));
                                }
                                ui.end_row();
                            }
                        });
                });
            });
    }

    pub fn format_cell(value: &AnyValue) -> String {
        match value {
            AnyValue::Null => String::new(),
            AnyValue::String(s) => s.to_string(),
            AnyValue::StringOwned(s) => s.to_string(),
            AnyValue::Float64(v) => format_number(*v),
            AnyValue::Float32(v) => format_number(f64::from(*v)),
            other => other.to_string(),
        }
    }

    fn summary_grid(ui: &mut egui::Ui, salt: impl std::hash::Hash, summary: &Summary) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ScrollArea::horizontal().id_salt(&salt).show(ui, |ui| {
                    let grid = egui::Grid::new(salt)
                        .striped(true)
                        .min_col_width(70.0)
                        .spacing([12.0, 4.0]);
                    match summary {
                        Summary::Numeric(rows) => {
                            grid.show(ui, |ui| Self::numeric_summary_rows(ui, rows));
                        }
                        Summary::Categorical(rows) => {
                            grid.show(ui, |ui| Self::categorical_summary_rows(ui, rows));
                        }
                        Summary::Empty => {
                            ui.label(RichText::new("Nothing to summarize").weak());
                        }
                    }
                });
            });
    }

    fn numeric_summary_rows(ui: &mut egui::Ui, rows: &[NumericSummary]) {
        ui.label("");
        for row in rows {
            ui.label(RichText::new(&row.column).strong().size(12.0));
        }
        ui.end_row();

        let stats: [(&str, fn(&NumericSummary) -> f64); 8] = [
            ("count", |s| s.count as f64),
            ("mean", |s| s.mean),
            ("std", |s| s.std),
            ("min", |s| s.min),
            ("25%", |s| s.p25),
            ("50%", |s| s.p50),
            ("75%", |s| s.p75),
            ("max", |s| s.max),
        ];
        for (name, value) in stats {
            ui.label(RichText::new(name).strong().size(12.0));
            for row in rows {
                ui.label(RichText::new(Self::format_stat(value(row))).size(12.0));
            }
            ui.end_row();
        }
    }

    fn categorical_summary_rows(ui: &mut egui::Ui, rows: &[CategoricalSummary]) {
        ui.label("");
        for row in rows {
            ui.label(RichText::new(&row.column).strong().size(12.0));
        }
        ui.end_row();

        let cells: [(&str, fn(&CategoricalSummary) -> String); 4] = [
            ("count", |s| s.count.to_string()),
            ("unique", |s| s.unique.to_string()),
            ("top", |s| s.top.clone().unwrap_or_else(|| "NaN".to_string())),
            ("freq", |s| s.freq.to_string()),
        ];
        for (name, value) in cells {
            ui.label(RichText::new(name).strong().size(12.0));
            for row in rows {
                ui.label(RichText::new(value(row)).size(12.0));
            }
            ui.end_row();
        }
    }

    /// Six decimals like a describe table; NaN stays visible.
    pub fn format_stat(value: f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else {
            format!("{value:.6}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cell() {
        assert_eq!(DatasetView::format_cell(&AnyValue::Null), "");
        assert_eq!(DatasetView::format_cell(&AnyValue::String("Oslo")), "Oslo");
        assert_eq!(DatasetView::format_cell(&AnyValue::Float64(2.0)), "2");
        assert_eq!(DatasetView::format_cell(&AnyValue::Float64(2.5)), "2.5");
        assert_eq!(DatasetView::format_cell(&AnyValue::Int64(42)), "42");
        assert_eq!(DatasetView::format_cell(&AnyValue::Boolean(true)), "true");
    }

    #[test]
    fn test_format_stat() {
        assert_eq!(DatasetView::format_stat(2.5), "2.500000");
        assert_eq!(DatasetView::format_stat(f64::NAN), "NaN");
    }
}
