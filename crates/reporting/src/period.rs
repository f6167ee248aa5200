//! Timestamp parsing and period labeling.
//!
//! Cohort keys and order periods both come out of [`PeriodLabeler::label`],
//! so the two axes can never disagree on granularity.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use cohort_core::{CohortError, CohortResult, Granularity, Period};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a raw event timestamp. Offsets are kept as written: the wall-clock
/// date in the string decides the period.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Maps timestamps onto periods of one fixed granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodLabeler {
    granularity: Granularity,
}

impl PeriodLabeler {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn label(&self, timestamp: &NaiveDateTime) -> Period {
        self.granularity.period_of(timestamp.date())
    }

    /// Parse and label a raw timestamp from input row `row`.
    pub fn label_raw(&self, row: usize, raw: &str) -> CohortResult<Period> {
        parse_timestamp(raw)
            .map(|ts| self.label(&ts))
            .ok_or_else(|| CohortError::MalformedTimestamp {
                row,
                value: raw.to_string(),
            })
    }
}
