//! Cohort retention reporting — cohort construction, retention
//! normalization, and the CSV/heatmap sinks that consume the result.

pub mod aggregation;
pub mod cohort;
pub mod export;
pub mod heatmap;
pub mod matrix;
pub mod period;
pub mod report;
pub mod sink;

pub use aggregation::Aggregation;
pub use cohort::{CohortBuilder, CohortCell};
pub use export::CsvExporter;
pub use heatmap::HeatmapRenderer;
pub use matrix::{CohortColumn, RetentionMatrix};
pub use period::PeriodLabeler;
pub use report::{CohortReport, ReportArtifacts};
pub use sink::{MatrixSink, SinkOutput, TerminalDisplay};
