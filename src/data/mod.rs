//! Data module - upload parsing, cleaning pipeline and export

mod dataset;
mod exporter;
mod loader;
mod processor;
mod session;

pub use dataset::{Dataset, Notice, ViewState};
pub use exporter::{processed_file_name, DataExporter, ExportFormat};
pub use loader::{format_number, DataLoader};
pub use processor::{DataProcessor, PipelineSpec, ProcessorError, SortOrder};
pub use session::Session;
