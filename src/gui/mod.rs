//! GUI module - User interface components

mod app;
mod control_panel;
mod dataset_view;
mod theme;

pub use app::DataSweeperApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use dataset_view::{DatasetAction, DatasetView};
