//! Data Processor Module
//! Cleaning, sorting, column selection and search over a dataset.

use crate::data::DataLoader;
use crate::stats::{StatsCalculator, Summary};
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    UnknownColumn(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// The part of the view state that shapes the table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineSpec {
    pub sort_column: Option<String>,
    pub sort_order: SortOrder,
    /// Columns to keep; output follows the source column order.
    pub columns: Vec<String>,
    pub search: String,
}

/// Result of running the pipeline over a dataset.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub frame: DataFrame,
    /// Describe statistics of the sorted table, before column selection.
    pub summary: Summary,
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Drop exact-duplicate rows, keeping the first occurrence in row order.
    pub fn remove_duplicates(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        if df.width() == 0 {
            return Ok(df.clone());
        }
        Ok(df.unique_stable(None, UniqueKeepStrategy::First, None)?)
    }

    /// Replace nulls in numeric columns with the column mean.
    ///
    /// NaN counts as missing. Filled columns become Float64. Numeric columns
    /// with nothing missing and non-numeric columns are returned untouched.
    pub fn fill_missing_with_mean(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let mut filled = df.clone();

        for name in DataLoader::numeric_columns(df) {
            let column = df.column(&name)?;
            let floats = column.as_materialized_series().cast(&DataType::Float64)?;
            let values: Float64Chunked = floats
                .f64()?
                .into_iter()
                .map(|v| v.filter(|v| !v.is_nan()))
                .collect();
            if values.null_count() == 0 {
                continue;
            }

            let Some(mean) = values.mean() else {
                continue;
            };

            let replaced = values
                .fill_null_with_values(mean)?
                .into_series()
                .with_name(name.as_str().into());
            filled.replace(&name, replaced)?;
        }

        Ok(filled)
    }

    /// Stable sort by one column; nulls go last in both directions.
    pub fn sort_by(
        df: &DataFrame,
        column: &str,
        order: SortOrder,
    ) -> Result<DataFrame, ProcessorError> {
        if df.column(column).is_err() {
            return Err(ProcessorError::UnknownColumn(column.to_string()));
        }

        let options = SortMultipleOptions::default()
            .with_order_descending(order == SortOrder::Descending)
            .with_nulls_last(true)
            .with_maintain_order(true);

        Ok(df.sort([column], options)?)
    }

    /// Keep the chosen columns in source order. Unknown names are ignored.
    pub fn select_columns(df: &DataFrame, columns: &[String]) -> Result<DataFrame, ProcessorError> {
        let keep: Vec<String> = DataLoader::column_names(df)
            .into_iter()
            .filter(|name| columns.contains(name))
            .collect();

        Ok(df.select(keep)?)
    }

    /// Case-insensitive substring search over the text form of every column.
    ///
    /// A row is kept when any of its cells contains the query. Null cells never match.
    pub fn search(df: &DataFrame, query: &str) -> Result<DataFrame, ProcessorError> {
        if query.is_empty() {
            return Ok(df.clone());
        }
        let needle = query.to_lowercase();
        let mut mask = vec![false; df.height()];

        for column in df.get_columns() {
            let text = column.as_materialized_series().cast(&DataType::String)?;
            for (keep, value) in mask.iter_mut().zip(text.str()?.into_iter()) {
                if *keep {
                    continue;
                }
                if let Some(value) = value {
                    *keep = value.to_lowercase().contains(&needle);
                }
            }
        }

        let mask = BooleanChunked::from_slice("mask".into(), &mask);
        Ok(df.filter(&mask)?)
    }

    /// Sort, summarize, project, then search.
    pub fn run_pipeline(
        base: &DataFrame,
        spec: &PipelineSpec,
    ) -> Result<PipelineOutput, ProcessorError> {
        let sorted = match &spec.sort_column {
            Some(column) => Self::sort_by(base, column, spec.sort_order)?,
            None => base.clone(),
        };

        let summary = StatsCalculator::describe(&sorted);
        let projected = Self::select_columns(&sorted, &spec.columns)?;
        let frame = Self::search(&projected, &spec.search)?;

        Ok(PipelineOutput { frame, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> DataFrame {
        df!(
            "name" => ["Ann", "Bob", "Cid", "Bob", "Dee"],
            "age" => [Some(31i64), Some(25), None, Some(25), Some(40)],
            "score" => [Some(1.5f64), None, Some(3.0), None, Some(4.5)],
            "city" => ["Oslo", "Lima", "Rome", "Lima", "Oslo"]
        )
        .unwrap()
    }

    fn strings(df: &DataFrame, column: &str) -> Vec<String> {
        df.column(column)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_remove_duplicates_keeps_first_and_is_idempotent() {
        let df = people();
        let once = DataProcessor::remove_duplicates(&df).unwrap();
        let twice = DataProcessor::remove_duplicates(&once).unwrap();

        assert_eq!(once.height(), 4);
        assert_eq!(twice.height(), once.height());
        assert_eq!(strings(&once, "name"), vec!["Ann", "Bob", "Cid", "Dee"]);
    }

    #[test]
    fn test_fill_missing_uses_pre_fill_mean() {
        let df = people();
        let filled = DataProcessor::fill_missing_with_mean(&df).unwrap();

        // age mean = (31 + 25 + 25 + 40) / 4
        let age = filled.column("age").unwrap().as_materialized_series().f64().unwrap().clone();
        assert_eq!(age.null_count(), 0);
        assert!((age.get(2).unwrap() - 30.25).abs() < 1e-12);
        assert_eq!(age.get(0), Some(31.0));

        let score = filled.column("score").unwrap().as_materialized_series().f64().unwrap().clone();
        assert!((score.get(1).unwrap() - 3.0).abs() < 1e-12);
        assert!((score.get(3).unwrap() - 3.0).abs() < 1e-12);

        for untouched in ["name", "city"] {
            let before = df.column(untouched).unwrap().as_materialized_series();
            let after = filled.column(untouched).unwrap().as_materialized_series();
            assert!(after.equals(before));
        }
    }

    #[test]
    fn test_fill_missing_treats_nan_as_missing() {
        let df = df!("score" => [1.5f64, f64::NAN, 2.5]).unwrap();
        let filled = DataProcessor::fill_missing_with_mean(&df).unwrap();

        let score = filled.column("score").unwrap().as_materialized_series();
        let score: Vec<Option<f64>> = score.f64().unwrap().into_iter().collect();
        assert_eq!(score, vec![Some(1.5), Some(2.0), Some(2.5)]);
    }

    #[test]
    fn test_fill_missing_on_csv_with_missing_tokens() {
        let csv = "age,score\n31,1.5\nNA,NaN\n25,2.5\nNaN,N/A\n";
        let df = DataLoader::load_bytes("people.csv", csv.as_bytes()).unwrap();
        let filled = DataProcessor::fill_missing_with_mean(&df).unwrap();

        let age = filled.column("age").unwrap().as_materialized_series();
        let age: Vec<Option<f64>> = age.f64().unwrap().into_iter().collect();
        assert_eq!(age, vec![Some(31.0), Some(28.0), Some(25.0), Some(28.0)]);

        let score = filled.column("score").unwrap().as_materialized_series();
        let score: Vec<Option<f64>> = score.f64().unwrap().into_iter().collect();
        assert_eq!(score, vec![Some(1.5), Some(2.0), Some(2.5), Some(2.0)]);
    }

    #[test]
    fn test_fill_missing_leaves_complete_columns_alone() {
        let df = df!("n" => [1i64, 2, 3], "s" => [Some("a"), None, Some("c")]).unwrap();
        let filled = DataProcessor::fill_missing_with_mean(&df).unwrap();

        assert_eq!(filled.column("n").unwrap().dtype(), &DataType::Int64);
        assert_eq!(filled.column("s").unwrap().null_count(), 1);
    }

    #[test]
    fn test_sort_descending_reverses_ascending_without_ties() {
        let df = df!("k" => [3i64, 1, 4, 2], "v" => ["c", "a", "d", "b"]).unwrap();

        let asc = DataProcessor::sort_by(&df, "k", SortOrder::Ascending).unwrap();
        let desc = DataProcessor::sort_by(&df, "k", SortOrder::Descending).unwrap();

        let mut reversed = strings(&asc, "v");
        reversed.reverse();
        assert_eq!(strings(&asc, "v"), vec!["a", "b", "c", "d"]);
        assert_eq!(strings(&desc, "v"), reversed);
    }

    #[test]
    fn test_sort_places_nulls_last() {
        let df = people();
        for order in [SortOrder::Ascending, SortOrder::Descending] {
            let sorted = DataProcessor::sort_by(&df, "age", order).unwrap();
            assert_eq!(strings(&sorted, "name").last().map(String::as_str), Some("Cid"));
        }
    }

    #[test]
    fn test_sort_unknown_column() {
        let err = DataProcessor::sort_by(&people(), "missing", SortOrder::Ascending).unwrap_err();
        assert!(matches!(err, ProcessorError::UnknownColumn(_)));
    }

    #[test]
    fn test_select_columns_keeps_source_order() {
        let picked = vec!["city".to_string(), "name".to_string(), "nope".to_string()];
        let projected = DataProcessor::select_columns(&people(), &picked).unwrap();

        assert_eq!(DataLoader::column_names(&projected), vec!["name", "city"]);
        assert_eq!(projected.height(), 5);
    }

    #[test]
    fn test_search_is_case_insensitive_across_columns() {
        let df = people();

        let hits = DataProcessor::search(&df, "oSLo").unwrap();
        assert_eq!(strings(&hits, "name"), vec!["Ann", "Dee"]);

        // Numeric cells are matched on their text form
        let hits = DataProcessor::search(&df, "4.5").unwrap();
        assert_eq!(strings(&hits, "name"), vec!["Dee"]);

        assert_eq!(DataProcessor::search(&df, "").unwrap().height(), 5);
        assert_eq!(DataProcessor::search(&df, "zzz").unwrap().height(), 0);
    }

    #[test]
    fn test_search_is_idempotent() {
        let df = people();
        let once = DataProcessor::search(&df, "li").unwrap();
        let twice = DataProcessor::search(&once, "li").unwrap();
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn test_pipeline_summarizes_before_projection() {
        let spec = PipelineSpec {
            sort_column: Some("name".to_string()),
            sort_order: SortOrder::Descending,
            columns: vec!["name".to_string()],
            search: "b".to_string(),
        };
        let output = DataProcessor::run_pipeline(&people(), &spec).unwrap();

        assert_eq!(DataLoader::column_names(&output.frame), vec!["name"]);
        assert_eq!(strings(&output.frame, "name"), vec!["Bob", "Bob"]);
        match output.summary {
            Summary::Numeric(rows) => {
                let names: Vec<&str> = rows.iter().map(|r| r.column.as_str()).collect();
                assert_eq!(names, vec!["age", "score"]);
            }
            other => panic!("expected numeric summary, got {other:?}"),
        }
    }
}
