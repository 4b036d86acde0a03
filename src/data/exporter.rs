//! Export Module
//! Serializes the processed table to CSV or a single-sheet XLSX workbook.

use crate::data::DataLoader;
use polars::prelude::*;
use rust_xlsxwriter::{Format, FormatBorder, Workbook};
use std::path::Path;
use thiserror::Error;

/// Worksheet name used for Excel exports.
const SHEET_NAME: &str = "Sheet1";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Excel writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Csv, ExportFormat::Excel];

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Excel => "Excel",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// `<original-name>_processed.<ext>`; the original name keeps its own extension.
pub fn processed_file_name(original: &str, format: ExportFormat) -> String {
    format!("{}_processed.{}", original, format.extension())
}

pub struct DataExporter;

impl DataExporter {
    pub fn export_bytes(df: &DataFrame, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::Csv => Self::to_csv(df),
            ExportFormat::Excel => Self::to_xlsx(df),
        }
    }

    pub fn save(df: &DataFrame, format: ExportFormat, path: &Path) -> Result<(), ExportError> {
        let bytes = Self::export_bytes(df, format)?;
        std::fs::write(path, bytes)?;
        log::info!(
            "Exported {} rows x {} columns to {} ({})",
            df.height(),
            df.width(),
            path.display(),
            format.mime_type()
        );
        Ok(())
    }

    /// UTF-8 CSV with a header row and no index column.
    fn to_csv(df: &DataFrame) -> Result<Vec<u8>, ExportError> {
        let mut df = df.clone();
        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer)
            .include_header(true)
            .finish(&mut df)?;
        Ok(buffer)
    }

    /// Bold header row, then one typed cell per value. Nulls stay blank.
    fn to_xlsx(df: &DataFrame) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col_idx, column) in df.get_columns().iter().enumerate() {
            let col = col_idx as u16;
            worksheet.write_string_with_format(0, col, column.name().as_str(), &header_format)?;

            let series = column.as_materialized_series();
            match series.dtype() {
                DataType::Boolean => {
                    for (row, value) in series.bool()?.into_iter().enumerate() {
                        if let Some(value) = value {
                            worksheet.write_boolean(row as u32 + 1, col, value)?;
                        }
                    }
                }
                dtype if DataLoader::is_numeric(dtype) => {
                    let floats = series.cast(&DataType::Float64)?;
                    for (row, value) in floats.f64()?.into_iter().enumerate() {
                        if let Some(value) = value.filter(|v| v.is_finite()) {
                            worksheet.write_number(row as u32 + 1, col, value)?;
                        }
                    }
                }
                _ => {
                    let text = series.cast(&DataType::String)?;
                    for (row, value) in text.str()?.into_iter().enumerate() {
                        if let Some(value) = value {
                            worksheet.write_string(row as u32 + 1, col, value)?;
                        }
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}
