use thiserror::Error;

use crate::types::Period;

pub type CohortResult<T> = Result<T, CohortError>;

#[derive(Error, Debug)]
pub enum CohortError {
    #[error("Malformed timestamp at row {row}: {value:?}")]
    MalformedTimestamp { row: usize, value: String },

    #[error("Missing customer identifier at row {row}")]
    MissingIdentifier { row: usize },

    #[error("Unsupported aggregation: {0:?} (expected count-distinct, sum or mean)")]
    UnsupportedAggregation(String),

    #[error("Cohort {cohort} has a zero baseline and cannot be normalized")]
    ZeroBaselineCohort { cohort: Period },

    #[error("Cohort {cohort} ratio at period {index} is not finite")]
    NonFiniteRatio { cohort: Period, index: usize },

    #[error("Metric field {field:?} missing at row {row}")]
    MissingMetricField { row: usize, field: String },

    #[error("Metric field {field:?} at row {row} is not a finite number")]
    NonNumericMetric { row: usize, field: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for CohortError {
    fn from(err: config::ConfigError) -> Self {
        CohortError::Config(err.to_string())
    }
}

impl CohortError {
    /// True for the errors raised while validating input rows.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CohortError::MalformedTimestamp { .. }
                | CohortError::MissingIdentifier { .. }
                | CohortError::MissingMetricField { .. }
                | CohortError::NonNumericMetric { .. }
        )
    }
}
