//! Statistics Calculator Module
//! Describe statistics for the summary table.

use crate::data::DataLoader;
use polars::prelude::*;
use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Describe row for one numeric column.
#[derive(Debug, Clone)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl NumericSummary {
    fn empty(column: &str) -> Self {
        Self {
            column: column.to_string(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            p50: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Describe row for one text-like column.
#[derive(Debug, Clone)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// Numeric columns are described when present, otherwise every column is
/// described categorically.
#[derive(Debug, Clone)]
pub enum Summary {
    Numeric(Vec<NumericSummary>),
    Categorical(Vec<CategoricalSummary>),
    Empty,
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Describe a table, one column per rayon task.
    pub fn describe(df: &DataFrame) -> Summary {
        let numeric = DataLoader::numeric_columns(df);

        if !numeric.is_empty() {
            let rows = numeric
                .par_iter()
                .map(|name| Self::compute_descriptive_stats(name, &Self::column_values(df, name)))
                .collect();
            return Summary::Numeric(rows);
        }

        if df.width() == 0 {
            return Summary::Empty;
        }

        let rows = df
            .get_columns()
            .par_iter()
            .map(Self::compute_categorical_stats)
            .collect();
        Summary::Categorical(rows)
    }

    /// Compute count, mean, sample std, min, quartiles and max.
    pub fn compute_descriptive_stats(column: &str, values: &[f64]) -> NumericSummary {
        let n = values.len();
        if n == 0 {
            return NumericSummary::empty(column);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let std = if n > 1 { values.std_dev() } else { f64::NAN };

        NumericSummary {
            column: column.to_string(),
            count: n,
            mean: values.mean(),
            std,
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            p50: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Count, distinct values and the most frequent value (first seen wins ties).
    pub fn compute_categorical_stats(column: &Column) -> CategoricalSummary {
        let mut order: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        if let Ok(text) = column.as_materialized_series().cast(&DataType::String) {
            if let Ok(ca) = text.str() {
                for value in ca.into_iter().flatten() {
                    match index.get(value) {
                        Some(&pos) => order[pos].1 += 1,
                        None => {
                            index.insert(value.to_string(), order.len());
                            order.push((value.to_string(), 1));
                        }
                    }
                }
            }
        }

        let count = order.iter().map(|(_, c)| c).sum();
        let mut top: Option<&(String, usize)> = None;
        for entry in &order {
            if top.map_or(true, |t| entry.1 > t.1) {
                top = Some(entry);
            }
        }

        CategoricalSummary {
            column: column.name().to_string(),
            count,
            unique: order.len(),
            top: top.map(|(value, _)| value.clone()),
            freq: top.map(|(_, c)| *c).unwrap_or(0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Non-null, non-NaN values of a column as f64.
    pub fn column_values(df: &DataFrame, column: &str) -> Vec<f64> {
        df.column(column)
            .ok()
            .and_then(|col| col.as_materialized_series().cast(&DataType::Float64).ok())
            .map(|series| {
                series
                    .f64()
                    .map(|ca| ca.into_iter().flatten().filter(|v| !v.is_nan()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}
