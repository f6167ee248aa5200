//! Aggregation strategies for cohort cells.

use cohort_core::{CohortError, CohortResult, FieldValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Number of unique values per cell.
    CountDistinct,
    Sum,
    Mean,
}

impl Aggregation {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::CountDistinct => "count-distinct",
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
        }
    }

    pub fn requires_numeric(&self) -> bool {
        !matches!(self, Aggregation::CountDistinct)
    }

    pub fn accumulator(&self) -> Accumulator {
        match self {
            Aggregation::CountDistinct => Accumulator::Distinct(HashSet::new()),
            Aggregation::Sum => Accumulator::Sum(0.0),
            Aggregation::Mean => Accumulator::Mean { sum: 0.0, count: 0 },
        }
    }
}

impl FromStr for Aggregation {
    type Err = CohortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count-distinct" | "count_distinct" | "nunique" => Ok(Aggregation::CountDistinct),
            "sum" => Ok(Aggregation::Sum),
            "mean" => Ok(Aggregation::Mean),
            _ => Err(CohortError::UnsupportedAggregation(s.to_string())),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hashable identity of a field value for distinct counting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DistinctKey {
    Number(u64),
    Text(String),
}

impl DistinctKey {
    fn of(value: FieldValue) -> Self {
        match value {
            // -0.0 and 0.0 count as the same value.
            FieldValue::Number(n) if n == 0.0 => DistinctKey::Number(0.0f64.to_bits()),
            FieldValue::Number(n) => DistinctKey::Number(n.to_bits()),
            FieldValue::Text(s) => DistinctKey::Text(s),
        }
    }
}

/// Running reduction for one (cohort, order period) cell.
#[derive(Debug, Clone)]
pub enum Accumulator {
    Distinct(HashSet<DistinctKey>),
    Sum(f64),
    Mean { sum: f64, count: u64 },
}

impl Accumulator {
    /// Fold one value in. `row` and `field` only feed the error.
    pub fn push(&mut self, value: FieldValue, row: usize, field: &str) -> CohortResult<()> {
        let non_numeric = || CohortError::NonNumericMetric {
            row,
            field: field.to_string(),
        };
        if let FieldValue::Number(n) = value {
            if !n.is_finite() {
                return Err(non_numeric());
            }
        }

        match self {
            Accumulator::Distinct(seen) => {
                seen.insert(DistinctKey::of(value));
            }
            Accumulator::Sum(sum) => {
                *sum += value.as_number().ok_or_else(non_numeric)?;
            }
            Accumulator::Mean { sum, count } => {
                *sum += value.as_number().ok_or_else(non_numeric)?;
                *count += 1;
            }
        }
        Ok(())
    }

    pub fn finish(&self) -> f64 {
        match self {
            Accumulator::Distinct(seen) => seen.len() as f64,
            Accumulator::Sum(sum) => *sum,
            Accumulator::Mean { sum, count } if *count > 0 => *sum / *count as f64,
            Accumulator::Mean { .. } => 0.0,
        }
    }
}
