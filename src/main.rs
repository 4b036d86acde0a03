//! Data Sweeper - CSV/Excel cleaning, visualization and conversion
//!
//! Upload tables, clean them, chart them and export the processed result.

mod charts;
mod data;
mod gui;
mod stats;

use eframe::egui;
use gui::DataSweeperApp;

fn main() -> eframe::Result<()> {
    env_logger::init();
    log::info!("Starting Data Sweeper");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 650.0])
            .with_drag_and_drop(true)
            .with_title("Data Sweeper"),
        ..Default::default()
    };

    eframe::run_native(
        "Data Sweeper",
        options,
        Box::new(|cc| Ok(Box::new(DataSweeperApp::new(cc)))),
    )
}
