//! Stats module - describe statistics

mod calculator;

pub use calculator::{CategoricalSummary, NumericSummary, StatsCalculator, Summary};
