//! The retention matrix handed to output sinks.

use cohort_core::Period;
use serde::Serialize;
use std::fmt;

use crate::aggregation::Aggregation;

/// One cohort's column: aggregates and ratios indexed by relative period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortColumn {
    pub cohort: Period,
    /// Aggregate at relative period 1.
    pub baseline: f64,
    /// Order period behind each relative index, chronological.
    pub periods: Vec<Period>,
    pub aggregates: Vec<f64>,
    pub ratios: Vec<f64>,
}

impl CohortColumn {
    /// Number of observed periods, i.e. the largest relative index.
    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    /// Ratio at 1-based relative index.
    pub fn ratio(&self, index: usize) -> Option<f64> {
        index.checked_sub(1).and_then(|i| self.ratios.get(i).copied())
    }
}

/// Rows are relative period indices (1-based), columns are cohorts in
/// chronological order. Cells past a cohort's last observed period are
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionMatrix {
    pub aggregation: Aggregation,
    pub metric_field: String,
    columns: Vec<CohortColumn>,
}

impl RetentionMatrix {
    pub(crate) fn new(aggregation: Aggregation, metric_field: String, columns: Vec<CohortColumn>) -> Self {
        Self {
            aggregation,
            metric_field,
            columns,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn cohort_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows: the longest cohort timeline.
    pub fn max_index(&self) -> usize {
        self.columns.iter().map(CohortColumn::len).max().unwrap_or(0)
    }

    pub fn columns(&self) -> &[CohortColumn] {
        &self.columns
    }

    pub fn cohorts(&self) -> impl Iterator<Item = &Period> {
        self.columns.iter().map(|c| &c.cohort)
    }

    pub fn column(&self, cohort: &Period) -> Option<&CohortColumn> {
        self.columns.iter().find(|c| &c.cohort == cohort)
    }

    /// Column lookup by period label, e.g. `"2023-01"`.
    pub fn column_by_label(&self, label: &str) -> Option<&CohortColumn> {
        self.columns.iter().find(|c| c.cohort.label() == label)
    }

    /// Ratio at (relative index, cohort).
    pub fn get(&self, index: usize, cohort: &Period) -> Option<f64> {
        self.column(cohort).and_then(|c| c.ratio(index))
    }

    /// One matrix row: every cohort's value at `index`.
    pub fn row(&self, index: usize) -> Vec<Option<f64>> {
        self.columns.iter().map(|c| c.ratio(index)).collect()
    }

    /// Cohort-major view used by the exports: one row per cohort, padded
    /// with `None` up to [`max_index`](Self::max_index).
    pub fn transposed(&self) -> Vec<(Period, Vec<Option<f64>>)> {
        let width = self.max_index();
        self.columns
            .iter()
            .map(|c| (c.cohort, (1..=width).map(|i| c.ratio(i)).collect()))
            .collect()
    }

    /// Smallest and largest ratio present, for color scaling.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.columns
            .iter()
            .flat_map(|c| c.ratios.iter().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl fmt::Display for RetentionMatrix {
    /// Aligned text grid, cohorts as rows.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.transposed();
        let label_w = rows
            .iter()
            .map(|(p, _)| p.label().len())
            .max()
            .unwrap_or(0)
            .max("cohort".len());
        let cell_w = 6;

        write!(f, "{:<label_w$}", "cohort")?;
        for i in 1..=self.max_index() {
            write!(f, " {i:>cell_w$}")?;
        }
        writeln!(f)?;

        for (cohort, cells) in &rows {
            write!(f, "{:<label_w$}", cohort.label())?;
            for cell in cells {
                match cell {
                    Some(v) => write!(f, " {v:>cell_w$.2}")?,
                    None => write!(f, " {:>cell_w$}", "")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
