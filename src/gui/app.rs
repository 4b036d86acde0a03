//! Data Sweeper Main Application
//! Side panel with uploads, central panel with one view per dataset.

use crate::charts::{ChartOutcome, StaticChartRenderer};
use crate::data::{processed_file_name, DataExporter, DataLoader, Session};
use crate::gui::{theme, ControlPanel, ControlPanelAction, DatasetAction, DatasetView};
use anyhow::{anyhow, Context};
use egui::{RichText, SidePanel};
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

/// A file waiting to be parsed.
enum Upload {
    Path(PathBuf),
    Bytes { name: String, bytes: Arc<[u8]> },
}

impl Upload {
    fn name(&self) -> String {
        match self {
            Upload::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            Upload::Bytes { name, .. } => name.clone(),
        }
    }

    fn load(&self) -> anyhow::Result<DataFrame> {
        match self {
            Upload::Path(path) => Ok(DataLoader::load_path(path)?),
            Upload::Bytes { name, bytes } => Ok(DataLoader::load_bytes(name, bytes)?),
        }
    }
}

/// File loading result from background thread
enum LoadResult {
    Loaded {
        name: String,
        result: anyhow::Result<DataFrame>,
    },
    Finished,
}

/// Main application window.
pub struct DataSweeperApp {
    session: Session,
    control_panel: ControlPanel,

    // Async file loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    queued: Vec<Upload>,
}

impl Default for DataSweeperApp {
    fn default() -> Self {
        Self {
            session: Session::new(),
            control_panel: ControlPanel::new(),
            load_rx: None,
            is_loading: false,
            queued: Vec::new(),
        }
    }
}

impl DataSweeperApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        theme::apply(&cc.egui_ctx);
        Self::default()
    }

    /// Handle file selection from the dialog
    fn handle_browse_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("CSV or Excel", &["csv", "xlsx"])
            .pick_files()
        {
            self.queued.extend(paths.into_iter().map(Upload::Path));
        }
    }

    fn collect_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            if let Some(path) = file.path {
                self.queued.push(Upload::Path(path));
            } else if let Some(bytes) = file.bytes {
                self.queued.push(Upload::Bytes {
                    name: file.name,
                    bytes,
                });
            }
        }
    }

    /// Parse queued files in a background thread, in upload order.
    fn start_loading(&mut self) {
        if self.is_loading || self.queued.is_empty() {
            return;
        }

        let uploads = std::mem::take(&mut self.queued);
        self.control_panel
            .set_status(format!("Loading {} file(s)...", uploads.len()));
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            for upload in uploads {
                let name = upload.name();
                let result = upload.load();
                if tx.send(LoadResult::Loaded { name, result }).is_err() {
                    return;
                }
            }
            let _ = tx.send(LoadResult::Finished);
        });
    }

    /// Check for file loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            loop {
                match rx.try_recv() {
                    Ok(LoadResult::Loaded { name, result }) => {
                        self.session.add_upload(&name, result);
                    }
                    Ok(LoadResult::Finished) => {
                        self.control_panel.set_status(format!(
                            "{} dataset(s) loaded",
                            self.session.datasets().len()
                        ));
                        self.is_loading = false;
                        should_keep_receiver = false;
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    // Loader thread died before reporting Finished
                    Err(TryRecvError::Disconnected) => {
                        log::error!("File loader thread exited before finishing");
                        self.control_panel
                            .set_error("❌ File loading stopped unexpectedly");
                        self.is_loading = false;
                        should_keep_receiver = false;
                        break;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Ask for a target file and write the processed table to it.
    fn download(&mut self, id: u64) -> anyhow::Result<Option<PathBuf>> {
        let dataset = self
            .session
            .get_mut(id)
            .ok_or_else(|| anyhow!("dataset {id} is no longer loaded"))?;
        let format = dataset.view.export_format;
        let processed = match dataset.processed() {
            Some(Ok(processed)) => processed,
            Some(Err(e)) => return Err(anyhow!("{e}")),
            None => return Ok(None),
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter(format.label(), &[format.extension()])
            .set_file_name(processed_file_name(&dataset.name, format))
            .save_file()
        else {
            return Ok(None);
        };

        DataExporter::save(&processed.frame, format, &path)
            .with_context(|| format!("Failed to export {}", dataset.name))?;
        Ok(Some(path))
    }

    fn save_chart(&mut self, id: u64) -> anyhow::Result<Option<PathBuf>> {
        let dataset = self
            .session
            .get_mut(id)
            .ok_or_else(|| anyhow!("dataset {id} is no longer loaded"))?;
        let Some(ChartOutcome::Ready(data)) = dataset.chart() else {
            return Ok(None);
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(format!("{}_chart.png", dataset.name))
            .save_file()
        else {
            return Ok(None);
        };

        let title = format!("{} - {}", dataset.name, data.kind().label());
        StaticChartRenderer::render_png(data, &title, &path)
            .with_context(|| format!("Failed to save chart for {}", dataset.name))?;
        Ok(Some(path))
    }

    fn handle_dataset_action(&mut self, id: u64, action: DatasetAction) {
        let outcome = match action {
            DatasetAction::None => return,
            DatasetAction::Download => self.download(id),
            DatasetAction::SaveChart => self.save_chart(id),
        };

        match outcome {
            Ok(Some(path)) => self
                .control_panel
                .set_status(format!("✔ Saved {}", path.display())),
            Ok(None) => {}
            Err(e) => {
                log::error!("{:#}", e);
                self.control_panel.set_error(format!("❌ {e:#}"));
            }
        }
    }
}

impl eframe::App for DataSweeperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_dropped_files(ctx);
        self.check_load_results();
        self.start_loading();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - uploads
        SidePanel::left("control_panel")
            .frame(egui::Frame::side_top_panel(&ctx.style()).fill(theme::SIDE_PANEL))
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui, &self.session, self.is_loading);

                    match action {
                        ControlPanelAction::Upload => self.handle_browse_files(),
                        ControlPanelAction::Remove(id) => self.session.remove(id),
                        ControlPanelAction::DismissErrors => self.session.clear_errors(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - one view per dataset
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.session.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new("Upload CSV or Excel files to get started")
                            .size(20.0)
                            .weak(),
                    );
                });
                return;
            }

            let mut pending = Vec::new();
            egui::ScrollArea::vertical().show(ui, |ui| {
                for dataset in self.session.datasets_mut() {
                    let id = dataset.id;
                    let action = ui.push_id(id, |ui| DatasetView::show(ui, dataset)).inner;
                    if action != DatasetAction::None {
                        pending.push((id, action));
                    }
                    ui.add_space(10.0);
                    ui.separator();
                }
            });

            for (id, action) in pending {
                self.handle_dataset_action(id, action);
            }
        });
    }
}
