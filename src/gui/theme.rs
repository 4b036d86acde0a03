//! Theme
//! Dark colour scheme and the coloured action buttons.

use egui::{Color32, Response, RichText, Ui};

pub const BACKGROUND: Color32 = Color32::from_rgb(0x0d, 0x11, 0x17);
pub const SIDE_PANEL: Color32 = Color32::from_rgb(0x16, 0x1b, 0x22);
pub const ACTION: Color32 = Color32::from_rgb(0x23, 0x86, 0x36);
pub const ACTION_HOVER: Color32 = Color32::from_rgb(0x2e, 0xa0, 0x43);
pub const DOWNLOAD: Color32 = Color32::from_rgb(0x82, 0x50, 0xdf);
pub const DOWNLOAD_HOVER: Color32 = Color32::from_rgb(0x7b, 0x3f, 0xdb);

pub const SUCCESS: Color32 = Color32::from_rgb(40, 167, 69);
pub const ERROR: Color32 = Color32::from_rgb(220, 53, 69);
pub const WARNING: Color32 = Color32::from_rgb(243, 156, 18);

pub fn apply(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = BACKGROUND;
    visuals.window_fill = SIDE_PANEL;
    visuals.extreme_bg_color = SIDE_PANEL;
    visuals.override_text_color = Some(Color32::WHITE);
    ctx.set_visuals(visuals);
}

/// Green button used for cleaning and upload actions.
pub fn action_button(ui: &mut Ui, text: &str) -> Response {
    filled_button(ui, text, ACTION, ACTION_HOVER)
}

/// Purple button used for downloads.
pub fn download_button(ui: &mut Ui, text: &str) -> Response {
    filled_button(ui, text, DOWNLOAD, DOWNLOAD_HOVER)
}

fn filled_button(ui: &mut Ui, text: &str, fill: Color32, hover: Color32) -> Response {
    ui.scope(|ui| {
        let widgets = &mut ui.visuals_mut().widgets;
        widgets.inactive.weak_bg_fill = fill;
        widgets.hovered.weak_bg_fill = hover;
        widgets.active.weak_bg_fill = hover;

        let button = egui::Button::new(RichText::new(text).size(16.0).color(Color32::WHITE))
            .rounding(5.0)
            .min_size(egui::vec2(0.0, 34.0));
        ui.add(button)
    })
    .inner
}
