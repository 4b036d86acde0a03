//! Dataset Module
//! One uploaded table plus its view state and cached pipeline results.

use crate::charts::{ChartData, ChartOutcome, ChartSelection};
use crate::data::{
    DataLoader, DataProcessor, ExportFormat, PipelineSpec, ProcessorError,
};
use crate::stats::Summary;
use polars::prelude::*;

/// Per-dataset widget selections. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub pipeline: PipelineSpec,
    pub chart: ChartSelection,
    pub export_format: ExportFormat,
}

/// Feedback shown under the cleaning buttons.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Pipeline output as displayed: the processed table and its summary.
#[derive(Debug, Clone)]
pub struct ProcessedView {
    pub frame: DataFrame,
    pub summary: Summary,
    pub numeric_columns: Vec<String>,
}

struct PipelineCache {
    revision: u64,
    spec: PipelineSpec,
    output: Result<ProcessedView, ProcessorError>,
}

struct ChartCache {
    selection: ChartSelection,
    outcome: ChartOutcome,
}

pub struct Dataset {
    pub id: u64,
    pub name: String,
    pub view: ViewState,
    pub notice: Option<Notice>,
    frame: DataFrame,
    /// Bumped on every in-place mutation of `frame`.
    revision: u64,
    pipeline_cache: Option<PipelineCache>,
    chart_cache: Option<ChartCache>,
}

impl Dataset {
    pub fn new(id: u64, name: impl Into<String>, frame: DataFrame) -> Self {
        let columns = DataLoader::column_names(&frame);
        let view = ViewState {
            pipeline: PipelineSpec {
                sort_column: columns.first().cloned(),
                columns,
                ..Default::default()
            },
            ..Default::default()
        };

        Self {
            id,
            name: name.into(),
            view,
            notice: None,
            frame,
            revision: 0,
            pipeline_cache: None,
            chart_cache: None,
        }
    }

    /// The cleaned table, before sort / projection / search.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn column_names(&self) -> Vec<String> {
        DataLoader::column_names(&self.frame)
    }

    pub fn remove_duplicates(&mut self) {
        match DataProcessor::remove_duplicates(&self.frame) {
            Ok(frame) => {
                log::info!(
                    "{}: removed {} duplicate rows",
                    self.name,
                    self.frame.height() - frame.height()
                );
                self.replace_frame(frame);
                self.notice = Some(Notice::Success(
                    "✔ Duplicates removed successfully!".to_string(),
                ));
            }
            Err(e) => {
                log::error!("{}: remove duplicates failed: {}", self.name, e);
                self.notice = Some(Notice::Error(format!("Remove duplicates failed: {e}")));
            }
        }
    }

    pub fn fill_missing(&mut self) {
        match DataProcessor::fill_missing_with_mean(&self.frame) {
            Ok(frame) => {
                log::info!("{}: filled missing numeric values with column means", self.name);
                self.replace_frame(frame);
                self.notice = Some(Notice::Success(
                    "✔ Missing values filled with column mean!".to_string(),
                ));
            }
            Err(e) => {
                log::error!("{}: fill missing failed: {}", self.name, e);
                self.notice = Some(Notice::Error(format!("Fill missing values failed: {e}")));
            }
        }
    }

    fn replace_frame(&mut self, frame: DataFrame) {
        self.frame = frame;
        self.revision += 1;
    }

    /// Recompute cached results whose inputs changed since the last call.
    pub fn refresh(&mut self) {
        let columns = self.column_names();
        let spec = &mut self.view.pipeline;
        if spec
            .sort_column
            .as_ref()
            .is_some_and(|c| !columns.contains(c))
        {
            spec.sort_column = columns.first().cloned();
        }

        let stale = self.pipeline_cache.as_ref().map_or(true, |cache| {
            cache.revision != self.revision || cache.spec != self.view.pipeline
        });
        if stale {
            log::debug!("{}: running pipeline (revision {})", self.name, self.revision);
            let output = DataProcessor::run_pipeline(&self.frame, &self.view.pipeline).map(
                |output| ProcessedView {
                    numeric_columns: DataLoader::numeric_columns(&output.frame),
                    frame: output.frame,
                    summary: output.summary,
                },
            );
            if let Err(e) = &output {
                log::warn!("{}: pipeline failed: {}", self.name, e);
            }
            self.pipeline_cache = Some(PipelineCache {
                revision: self.revision,
                spec: self.view.pipeline.clone(),
                output,
            });
            self.chart_cache = None;
        }

        let Some(PipelineCache {
            output: Ok(processed),
            ..
        }) = &self.pipeline_cache
        else {
            self.chart_cache = None;
            return;
        };

        self.view.chart.normalize(&processed.numeric_columns);
        let chart_stale = self
            .chart_cache
            .as_ref()
            .map_or(true, |cache| cache.selection != self.view.chart);
        if chart_stale {
            let outcome = ChartData::prepare(&processed.frame, &self.view.chart);
            self.chart_cache = Some(ChartCache {
                selection: self.view.chart.clone(),
                outcome,
            });
        }
    }

    /// Latest pipeline result; `None` until [`Dataset::refresh`] has run.
    pub fn processed(&self) -> Option<Result<&ProcessedView, &ProcessorError>> {
        self.pipeline_cache.as_ref().map(|cache| cache.output.as_ref())
    }

    pub fn chart(&self) -> Option<&ChartOutcome> {
        self.chart_cache.as_ref().map(|cache| &cache.outcome)
    }
}
