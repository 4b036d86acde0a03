//! Control Panel Widget
//! Left side panel with the upload controls and the loaded datasets.

use crate::data::Session;
use crate::gui::theme;
use egui::{Color32, RichText, ScrollArea};

/// Left side control panel with file selection and upload status.
pub struct ControlPanel {
    pub status: String,
    status_is_error: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            status_is_error: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, session: &Session, is_loading: bool) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(RichText::new("⚙️ Data Sweeper").size(22.0).strong());
            ui.label(
                RichText::new("Upload, clean, and visualize your data efficiently.")
                    .size(12.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Upload Section =====
        ui.label(RichText::new("📂 Upload CSV or Excel").size(14.0).strong());
        ui.add_space(5.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!is_loading, |ui| {
                if theme::action_button(ui, "📂 Browse Files").clicked() {
                    action = ControlPanelAction::Upload;
                }
            });
            ui.label(
                RichText::new("or drop .csv / .xlsx files on the window")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
            if is_loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading...");
                });
            }
        });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Loaded Files =====
        ui.label(RichText::new("📁 Loaded Files").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                if session.is_empty() {
                    ui.label(RichText::new("No files uploaded").size(12.0).color(Color32::GRAY));
                }
                ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                    for dataset in session.datasets() {
                        ui.horizontal(|ui| {
                            let (rows, cols) = dataset.frame().shape();
                            ui.label(RichText::new(&dataset.name).size(12.0))
                                .on_hover_text(format!("{rows} rows × {cols} columns"));
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("✖").on_hover_text("Remove").clicked() {
                                        action = ControlPanelAction::Remove(dataset.id);
                                    }
                                },
                            );
                        });
                    }
                });
            });

        // ===== Upload Errors =====
        if !session.errors().is_empty() {
            ui.add_space(10.0);
            for error in session.errors() {
                ui.label(RichText::new(error).size(12.0).color(theme::ERROR));
            }
            if ui.small_button("Dismiss").clicked() {
                action = ControlPanelAction::DismissErrors;
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(5.0);

        let status_color = if self.status_is_error {
            theme::ERROR
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_is_error = false;
    }

    pub fn set_error(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_is_error = true;
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Upload,
    Remove(u64),
    DismissErrors,
}
