//! Upload Loader Module
//! Parses uploaded CSV / XLSX bytes into Polars DataFrames.

use calamine::{Data, Reader, Xlsx};
use polars::io::csv::read::{CsvReadOptions, NullValues};
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Rows sampled when inferring the CSV schema.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Cell texts read as missing, on top of empty fields.
const NULL_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Failed to parse table: {0}")]
    Polars(#[from] PolarsError),
    #[error("Failed to read Excel file: {0}")]
    Excel(#[from] calamine::XlsxError),
    #[error("Excel file contains no sheets")]
    NoSheets,
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported upload formats, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    pub fn from_name(name: &str) -> Result<Self, LoaderError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" => Ok(FileKind::Xlsx),
            "" => Err(LoaderError::UnsupportedFileType("(no extension)".to_string())),
            other => Err(LoaderError::UnsupportedFileType(format!(".{other}"))),
        }
    }
}

/// Stateless loader: every upload becomes one DataFrame.
pub struct DataLoader;

impl DataLoader {
    /// Parse an uploaded file's bytes, dispatching on the file name's extension.
    pub fn load_bytes(name: &str, bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        match FileKind::from_name(name)? {
            FileKind::Csv => Self::read_csv(bytes),
            FileKind::Xlsx => Self::read_xlsx(bytes),
        }
    }

    /// Read a file from disk. The extension is checked before any I/O.
    pub fn load_path(path: &Path) -> Result<DataFrame, LoaderError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        FileKind::from_name(&name)?;

        let bytes = std::fs::read(path)?;
        Self::load_bytes(&name, &bytes)
    }

    fn read_csv(bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .map_parse_options(|opts| {
                let tokens = NULL_TOKENS.iter().map(|t| (*t).into()).collect();
                opts.with_null_values(Some(NullValues::AllColumns(tokens)))
            })
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()?;
        Ok(df)
    }

    /// Only the first worksheet is read; row 0 holds the column names.
    fn read_xlsx(bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(LoaderError::NoSheets)??;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(DataFrame::empty());
        };
        let names = Self::header_names(header);
        let body: Vec<&[Data]> = rows.collect();

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<Option<&Data>> = body
                    .iter()
                    .map(|row| row.get(idx).filter(|cell| Self::has_value(cell)))
                    .collect();
                Self::sheet_column(name, &cells)
            })
            .collect::<PolarsResult<Vec<Column>>>()?;

        Ok(DataFrame::new(columns)?)
    }

    /// Blank headers become `Unnamed: <idx>`. Repeats get a `.<n>` suffix,
    /// bumped until the name is not taken.
    fn header_names(header: &[Data]) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();

        header
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let mut name = match Self::cell_text(cell) {
                    Some(text) if !text.is_empty() => text,
                    _ => format!("Unnamed: {idx}"),
                };
                let mut count = counts.get(&name).copied().unwrap_or(0);
                while count > 0 {
                    counts.insert(name.clone(), count + 1);
                    name = format!("{name}.{count}");
                    count = counts.get(&name).copied().unwrap_or(0);
                }
                counts.insert(name.clone(), count + 1);
                name
            })
            .collect()
    }

    fn has_value(cell: &Data) -> bool {
        !matches!(cell, Data::Empty | Data::Error(_))
    }

    fn cell_text(cell: &Data) -> Option<String> {
        match cell {
            Data::Empty | Data::Error(_) => None,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
            Data::Float(f) => Some(format_number(*f)),
            Data::Int(i) => Some(i.to_string()),
            Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            Data::DateTime(dt) => Some(
                dt.as_datetime()
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| format_number(dt.as_f64())),
            ),
        }
    }

    /// Type a sheet column from its non-empty cells.
    fn sheet_column(name: String, cells: &[Option<&Data>]) -> PolarsResult<Column> {
        let present: Vec<&Data> = cells.iter().flatten().copied().collect();

        let all_bool = !present.is_empty() && present.iter().all(|c| matches!(c, Data::Bool(_)));
        let all_numeric = present.iter().all(|c| matches!(c, Data::Float(_) | Data::Int(_)));
        let all_dates = !present.is_empty()
            && present.iter().all(|c| match c {
                Data::DateTime(dt) => dt.is_datetime() && dt.as_datetime().is_some(),
                _ => false,
            });

        if all_dates {
            let millis: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    Some(Data::DateTime(dt)) => dt
                        .as_datetime()
                        .map(|d| d.and_utc().timestamp_millis()),
                    _ => None,
                })
                .collect();
            return Column::new(name.into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None));
        }

        if all_bool {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Some(Data::Bool(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            return Ok(Column::new(name.into(), values));
        }

        if all_numeric {
            let integral = present.iter().all(|c| match c {
                Data::Int(_) => true,
                Data::Float(f) => is_integral(*f),
                _ => false,
            });

            if integral && !present.is_empty() {
                let values: Vec<Option<i64>> = cells
                    .iter()
                    .map(|c| match c {
                        Some(Data::Int(i)) => Some(*i),
                        Some(Data::Float(f)) => Some(*f as i64),
                        _ => None,
                    })
                    .collect();
                return Ok(Column::new(name.into(), values));
            }

            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    Some(Data::Int(i)) => Some(*i as f64),
                    Some(Data::Float(f)) => Some(*f),
                    _ => None,
                })
                .collect();
            return Ok(Column::new(name.into(), values));
        }

        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| c.and_then(Self::cell_text))
            .collect();
        Ok(Column::new(name.into(), values))
    }

    /// Get list of column names.
    pub fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get list of numeric column names.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| Self::is_numeric(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    pub fn is_numeric(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Float32
                | DataType::Float64
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15
}

/// Integers without a trailing `.0`, everything else as-is.
pub fn format_number(value: f64) -> String {
    if is_integral(value) {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataExporter, ExportFormat};
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
    use std::io::Write;

    const FRUIT_CSV: &str = "name,qty,price,fresh\napple,3,1.5,true\npear,5,2.25,false\nplum,,0.75,true\n";

    #[test]
    fn test_extension_dispatch_is_case_insensitive() {
        assert_eq!(FileKind::from_name("Sales.CSV").unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_name("report.final.xlsx").unwrap(), FileKind::Xlsx);
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let err = DataLoader::load_bytes("notes.txt", b"hello").unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedFileType(ref ext) if ext == ".txt"));
        assert_eq!(err.to_string(), "Unsupported file type: .txt");

        let err = FileKind::from_name("README").unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_csv_infers_types_and_nulls() {
        let df = DataLoader::load_bytes("fruit.csv", FRUIT_CSV.as_bytes()).unwrap();

        assert_eq!(df.shape(), (3, 4));
        assert_eq!(df.column("name").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("qty").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("qty").unwrap().null_count(), 1);
        assert_eq!(DataLoader::numeric_columns(&df), vec!["qty", "price"]);
    }

    #[test]
    fn test_csv_and_xlsx_with_same_content_match() {
        let from_csv = DataLoader::load_bytes("fruit.csv", FRUIT_CSV.as_bytes()).unwrap();
        let xlsx = DataExporter::export_bytes(&from_csv, ExportFormat::Excel).unwrap();
        let from_xlsx = DataLoader::load_bytes("fruit.xlsx", &xlsx).unwrap();

        assert!(from_csv.equals_missing(&from_xlsx));
    }

    #[test]
    fn test_xlsx_header_fallbacks_and_mixed_columns() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "id").unwrap();
        sheet.write_string(0, 2, "id").unwrap();
        sheet.write_number(1, 0, 1).unwrap();
        sheet.write_string(1, 1, "x").unwrap();
        sheet.write_number(1, 2, 2.5).unwrap();
        sheet.write_number(2, 0, 2).unwrap();
        sheet.write_number(2, 1, 7).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let df = DataLoader::load_bytes("mixed.xlsx", &bytes).unwrap();

        assert_eq!(DataLoader::column_names(&df), vec!["id", "Unnamed: 1", "id.1"]);
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("id.1").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("id.1").unwrap().null_count(), 1);

        let mixed = df.column("Unnamed: 1").unwrap().as_materialized_series();
        let mixed = mixed.str().unwrap();
        assert_eq!(mixed.get(0), Some("x"));
        assert_eq!(mixed.get(1), Some("7"));
    }

    #[test]
    fn test_csv_missing_value_tokens_become_null() {
        let csv = "name,age,score\nAnn,31,1.5\nBob,NA,NaN\nCid,25,N/A\nDee,NaN,2.5\nEve,null,<NA>\n";
        let df = DataLoader::load_bytes("people.csv", csv.as_bytes()).unwrap();

        assert_eq!(df.column("age").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("age").unwrap().null_count(), 3);
        assert_eq!(df.column("score").unwrap().null_count(), 3);
        assert_eq!(DataLoader::numeric_columns(&df), vec!["age", "score"]);
    }

    #[test]
    fn test_xlsx_date_cells_load_as_datetime() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        sheet.write_string(0, 0, "day").unwrap();
        sheet.write_string(0, 1, "sold").unwrap();
        let day = ExcelDateTime::from_ymd(2024, 1, 15).unwrap();
        sheet.write_datetime_with_format(1, 0, &day, &date_format).unwrap();
        sheet.write_number(1, 1, 4).unwrap();
        sheet.write_number(2, 1, 6).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let df = DataLoader::load_bytes("sales.xlsx", &bytes).unwrap();

        let day = df.column("day").unwrap();
        assert_eq!(day.dtype(), &DataType::Datetime(TimeUnit::Milliseconds, None));
        let millis = day.as_materialized_series().cast(&DataType::Int64).unwrap();
        let millis: Vec<Option<i64>> = millis.i64().unwrap().into_iter().collect();
        assert_eq!(millis, vec![Some(1_705_276_800_000), None]);
    }

    #[test]
    fn test_repeated_headers_get_unused_suffixes() {
        let header: Vec<Data> = ["a", "a", "a.1", "a"]
            .iter()
            .map(|h| Data::String(h.to_string()))
            .collect();
        assert_eq!(DataLoader::header_names(&header), vec!["a", "a.1", "a.1.1", "a.2"]);

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["a", "a", "a.1"].iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
            sheet.write_number(1, col as u16, col as f64).unwrap();
        }
        let bytes = workbook.save_to_buffer().unwrap();

        let df = DataLoader::load_bytes("dupes.xlsx", &bytes).unwrap();
        assert_eq!(DataLoader::column_names(&df), vec!["a", "a.1", "a.1.1"]);
    }

    #[test]
    fn test_load_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fruit.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(FRUIT_CSV.as_bytes()).unwrap();

        let df = DataLoader::load_path(&path).unwrap();
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_load_path_rejects_before_reading() {
        // The file does not exist: the extension check must fail first.
        let err = DataLoader::load_path(Path::new("/nonexistent/data.json")).unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.5), "-2.5");
    }
}
