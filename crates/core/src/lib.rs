//! Shared types, error taxonomy, and configuration for cohort retention
//! reporting.

pub mod config;
pub mod error;
pub mod types;

pub use crate::config::{CohortConfig, HeatmapConfig};
pub use error::{CohortError, CohortResult};
pub use types::{Event, FieldValue, Granularity, Period, CUSTOMER_ID_FIELD};
