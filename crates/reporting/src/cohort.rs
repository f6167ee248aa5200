//! Cohort analysis — customers grouped by first-seen period, with retention
//! ratios per relative period.

use cohort_core::{CohortConfig, CohortError, CohortResult, Event, Granularity, Period, CUSTOMER_ID_FIELD};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::aggregation::{Accumulator, Aggregation};
use crate::matrix::{CohortColumn, RetentionMatrix};
use crate::period::PeriodLabeler;

/// An aggregated cell keyed by cohort and 1-based relative period index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortCell {
    pub cohort: Period,
    pub index: usize,
    pub order_period: Period,
    pub value: f64,
}

/// Input row after validation and period labeling.
#[derive(Debug)]
struct LabeledEvent<'a> {
    row: usize,
    customer_id: &'a str,
    order_period: Period,
    event: &'a Event,
}

struct CellState {
    first_row: usize,
    acc: Accumulator,
}

/// Builds retention matrices from event slices. Holds only configuration,
/// so one builder can serve many inputs.
#[derive(Debug, Clone)]
pub struct CohortBuilder {
    aggregation: Aggregation,
    metric_field: String,
    labeler: PeriodLabeler,
}

impl CohortBuilder {
    /// Builder counting unique customers per monthly cohort cell.
    pub fn new(aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            metric_field: CUSTOMER_ID_FIELD.to_string(),
            labeler: PeriodLabeler::default(),
        }
    }

    /// Validate the configured strategy name before any event is touched.
    pub fn from_config(config: &CohortConfig) -> CohortResult<Self> {
        let aggregation: Aggregation = config.aggregation.parse()?;
        Ok(Self::new(aggregation)
            .with_metric_field(config.metric_field.clone())
            .with_granularity(config.granularity))
    }

    pub fn with_metric_field(mut self, field: impl Into<String>) -> Self {
        self.metric_field = field.into();
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.labeler = PeriodLabeler::new(granularity);
        self
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn metric_field(&self) -> &str {
        &self.metric_field
    }

    pub fn granularity(&self) -> Granularity {
        self.labeler.granularity()
    }

    /// Full pipeline: label, assign cohorts, aggregate, index, normalize.
    pub fn build(&self, events: &[Event]) -> CohortResult<RetentionMatrix> {
        let cells = self.cells(events)?;
        let matrix = self.normalize(cells)?;
        info!(
            events = events.len(),
            cohorts = matrix.cohort_count(),
            max_index = matrix.max_index(),
            aggregation = %self.aggregation,
            metric_field = %self.metric_field,
            "Retention matrix built"
        );
        Ok(matrix)
    }

    /// Cohort key per customer: the earliest period among its events.
    pub fn cohort_keys(&self, events: &[Event]) -> CohortResult<BTreeMap<String, Period>> {
        let labeled = self.label(events)?;
        Ok(assign_cohort_keys(&labeled)
            .into_iter()
            .map(|(id, period)| (id.to_string(), period))
            .collect())
    }

    /// Aggregated cells with relative indices, cohort-major and
    /// chronological within each cohort.
    pub fn cells(&self, events: &[Event]) -> CohortResult<Vec<CohortCell>> {
        let labeled = self.label(events)?;
        let keys = assign_cohort_keys(&labeled);
        let aggregates = self.aggregate(&labeled, &keys)?;
        Ok(index_relative(aggregates))
    }

    fn label<'a>(&self, events: &'a [Event]) -> CohortResult<Vec<LabeledEvent<'a>>> {
        events
            .iter()
            .enumerate()
            .map(|(row, event)| -> CohortResult<LabeledEvent<'a>> {
                let customer_id = event
                    .customer_id
                    .as_deref()
                    .filter(|id| !id.trim().is_empty())
                    .ok_or(CohortError::MissingIdentifier { row })?;
                let order_period = self.labeler.label_raw(row, &event.occurred_at)?;
                Ok(LabeledEvent {
                    row,
                    customer_id,
                    order_period,
                    event,
                })
            })
            .collect()
    }

    fn aggregate(
        &self,
        labeled: &[LabeledEvent<'_>],
        keys: &HashMap<&str, Period>,
    ) -> CohortResult<BTreeMap<(Period, Period), f64>> {
        let mut cells: BTreeMap<(Period, Period), CellState> = BTreeMap::new();

        for item in labeled {
            let cohort = keys[item.customer_id];
            let value = item
                .event
                .field(&self.metric_field)
                .ok_or_else(|| CohortError::MissingMetricField {
                    row: item.row,
                    field: self.metric_field.clone(),
                })?;
            cells
                .entry((cohort, item.order_period))
                .or_insert_with(|| CellState {
                    first_row: item.row,
                    acc: self.aggregation.accumulator(),
                })
                .acc
                .push(value, item.row, &self.metric_field)?;
        }

        cells
            .into_iter()
            .map(|(key, state)| {
                let value = state.acc.finish();
                if !value.is_finite() {
                    return Err(CohortError::NonNumericMetric {
                        row: state.first_row,
                        field: self.metric_field.clone(),
                    });
                }
                Ok((key, value))
            })
            .collect()
    }

    /// Divide each cohort's aggregates by its baseline. A zero baseline or a
    /// ratio that overflows to infinity fails the build. Ratios are negative
    /// when a sum or mean baseline and its later aggregate differ in sign.
    fn normalize(&self, cells: Vec<CohortCell>) -> CohortResult<RetentionMatrix> {
        let mut grouped: BTreeMap<Period, Vec<CohortCell>> = BTreeMap::new();
        for cell in cells {
            grouped.entry(cell.cohort).or_default().push(cell);
        }

        let mut columns = Vec::with_capacity(grouped.len());
        for (cohort, cells) in grouped {
            let baseline = cells.first().map(|c| c.value).unwrap_or(0.0);
            if baseline == 0.0 {
                return Err(CohortError::ZeroBaselineCohort { cohort });
            }

            let aggregates: Vec<f64> = cells.iter().map(|c| c.value).collect();
            let ratios = aggregates
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let ratio = v / baseline;
                    if ratio.is_finite() {
                        Ok(ratio)
                    } else {
                        Err(CohortError::NonFiniteRatio { cohort, index: i + 1 })
                    }
                })
                .collect::<CohortResult<Vec<f64>>>()?;
            debug!(cohort = %cohort, baseline, periods = aggregates.len(), "Cohort normalized");

            columns.push(CohortColumn {
                cohort,
                baseline,
                periods: cells.iter().map(|c| c.order_period).collect(),
                aggregates,
                ratios,
            });
        }

        Ok(RetentionMatrix::new(self.aggregation, self.metric_field.clone(), columns))
    }
}

fn assign_cohort_keys<'a>(labeled: &[LabeledEvent<'a>]) -> HashMap<&'a str, Period> {
    let mut keys: HashMap<&'a str, Period> = HashMap::new();
    for item in labeled {
        keys.entry(item.customer_id)
            .and_modify(|p| *p = (*p).min(item.order_period))
            .or_insert(item.order_period);
    }
    keys
}

/// Number each cohort's observed order periods 1..k. The map is ordered by
/// (cohort, order period), so enumeration order is chronological.
fn index_relative(aggregates: BTreeMap<(Period, Period), f64>) -> Vec<CohortCell> {
    let mut cells = Vec::with_capacity(aggregates.len());
    let mut current: Option<Period> = None;
    let mut index = 0;

    for ((cohort, order_period), value) in aggregates {
        if current != Some(cohort) {
            current = Some(cohort);
            index = 0;
        }
        index += 1;
        cells.push(CohortCell {
            cohort,
            index,
            order_period,
            value,
        });
    }
    cells
}
