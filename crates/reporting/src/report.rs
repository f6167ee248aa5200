//! Cohort retention report — build the matrix once, then hand it to every
//! configured sink (CSV, heatmap, terminal).

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{error, info, warn};

use cohort_core::{CohortConfig, CohortResult, Event};

use crate::cohort::CohortBuilder;
use crate::export::CsvExporter;
use crate::heatmap::HeatmapRenderer;
use crate::matrix::RetentionMatrix;
use crate::sink::{MatrixSink, SinkOutput, TerminalDisplay};

pub type BoxedSink = Box<dyn MatrixSink + Send + Sync>;

/// Everything one report run produced.
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub matrix: RetentionMatrix,
    pub outputs: Vec<(&'static str, SinkOutput)>,
    pub generated_at: DateTime<Utc>,
}

impl ReportArtifacts {
    /// Paths written by file sinks, in sink order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.outputs
            .iter()
            .filter_map(|(_, out)| match out {
                SinkOutput::File(path) => Some(path.clone()),
                SinkOutput::Displayed => None,
            })
            .collect()
    }

    pub fn matrix_json(&self) -> CohortResult<String> {
        Ok(serde_json::to_string_pretty(&self.matrix)?)
    }
}

pub struct CohortReport {
    config: CohortConfig,
    builder: CohortBuilder,
    sinks: Vec<BoxedSink>,
}

impl CohortReport {
    /// Validates the configuration and wires the default sinks:
    /// `<save_as>.csv`, `<save_as>.png`, and the terminal when `show` is set.
    pub fn new(config: CohortConfig) -> CohortResult<Self> {
        let builder = CohortBuilder::from_config(&config)?;
        let mut sinks: Vec<BoxedSink> = vec![
            Box::new(CsvExporter::new(config.csv_path())),
            Box::new(HeatmapRenderer::new(config.png_path(), config.heatmap.clone())),
        ];
        if config.show {
            sinks.push(Box::new(TerminalDisplay::stdout()));
        }
        Ok(Self {
            config,
            builder,
            sinks,
        })
    }

    /// Report with no sinks; add them with [`with_sink`](Self::with_sink).
    pub fn without_sinks(config: CohortConfig) -> CohortResult<Self> {
        let builder = CohortBuilder::from_config(&config)?;
        Ok(Self {
            config,
            builder,
            sinks: Vec::new(),
        })
    }

    pub fn with_sink(mut self, sink: impl MatrixSink + Send + Sync + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn builder(&self) -> &CohortBuilder {
        &self.builder
    }

    pub fn config(&self) -> &CohortConfig {
        &self.config
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, events: &[Event]) -> CohortResult<ReportArtifacts> {
        let matrix = self.builder.build(events).inspect_err(|e| {
            if e.is_input_error() {
                warn!(error = %e, "Rejected cohort input");
            } else {
                error!(error = %e, "Cohort build failed");
            }
        })?;

        if !self.sinks.is_empty() {
            std::fs::create_dir_all(&self.config.output_dir)?;
        }

        let mut outputs = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let output = sink.consume(&matrix).inspect_err(|e| {
                error!(sink = sink.name(), error = %e, "Sink failed");
            })?;
            outputs.push((sink.name(), output));
        }

        info!(
            save_as = %self.config.save_as,
            cohorts = matrix.cohort_count(),
            sinks = outputs.len(),
            "Cohort report generated"
        );

        Ok(ReportArtifacts {
            matrix,
            outputs,
            generated_at: Utc::now(),
        })
    }
}
