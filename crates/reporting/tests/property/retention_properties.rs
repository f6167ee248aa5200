use chrono::{Duration, NaiveDate};
use cohort_core::{Event, Granularity, Period};
use cohort_reporting::{Aggregation, CohortBuilder};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap() + Duration::days(offset)
}

fn events_strategy() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec((0u8..12, 0i64..730, 1u32..5_000), 1..120).prop_map(|rows| {
        rows.into_iter()
            .map(|(customer, offset, cents)| {
                Event::new(format!("cust-{customer}"), day(offset).format("%Y-%m-%d").to_string())
                    .with_attribute("amount", f64::from(cents) / 100.0)
            })
            .collect()
    })
}

fn granularity_strategy() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Day),
        Just(Granularity::Week),
        Just(Granularity::Month),
        Just(Granularity::Quarter),
        Just(Granularity::Year),
    ]
}

fn aggregation_strategy() -> impl Strategy<Value = Aggregation> {
    prop_oneof![Just(Aggregation::CountDistinct), Just(Aggregation::Sum), Just(Aggregation::Mean)]
}

fn builder(aggregation: Aggregation, granularity: Granularity) -> CohortBuilder {
    let field = if aggregation == Aggregation::CountDistinct { "customer_id" } else { "amount" };
    CohortBuilder::new(aggregation)
        .with_metric_field(field)
        .with_granularity(granularity)
}

fn reference_periods(events: &[Event], granularity: Granularity) -> BTreeMap<String, BTreeSet<Period>> {
    let mut periods: BTreeMap<String, BTreeSet<Period>> = BTreeMap::new();
    for e in events {
        let date = NaiveDate::parse_from_str(&e.occurred_at, "%Y-%m-%d").unwrap();
        periods
            .entry(e.customer_id.clone().unwrap())
            .or_default()
            .insert(granularity.period_of(date));
    }
    periods
}

proptest! {
    #[test]
    fn first_period_ratio_is_exactly_one(
        events in events_strategy(),
        agg in aggregation_strategy(),
        granularity in granularity_strategy(),
    ) {
        let matrix = builder(agg, granularity).build(&events).unwrap();
        prop_assert!(!matrix.is_empty());
        for col in matrix.columns() {
            prop_assert_eq!(col.ratios[0], 1.0);
            prop_assert!(col.ratios.iter().all(|r| r.is_finite() && *r >= 0.0));
        }
    }

    #[test]
    fn indices_are_contiguous_per_cohort(
        events in events_strategy(),
        granularity in granularity_strategy(),
    ) {
        let b = builder(Aggregation::CountDistinct, granularity);
        let cells = b.cells(&events).unwrap();
        let keys = b.cohort_keys(&events).unwrap();

        let mut expected_periods: BTreeMap<Period, BTreeSet<Period>> = BTreeMap::new();
        for (customer, periods) in reference_periods(&events, granularity) {
            expected_periods.entry(keys[&customer]).or_default().extend(periods);
        }

        let mut by_cohort: BTreeMap<Period, Vec<(usize, Period)>> = BTreeMap::new();
        for cell in &cells {
            by_cohort.entry(cell.cohort).or_default().push((cell.index, cell.order_period));
        }

        prop_assert_eq!(by_cohort.len(), expected_periods.len());
        for (cohort, indexed) in by_cohort {
            let expected = &expected_periods[&cohort];
            let indices: Vec<usize> = indexed.iter().map(|(i, _)| *i).collect();
            prop_assert_eq!(indices, (1..=expected.len()).collect::<Vec<_>>());
            let periods: Vec<Period> = indexed.iter().map(|(_, p)| *p).collect();
            prop_assert_eq!(periods, expected.iter().copied().collect::<Vec<_>>());
        }
    }

    #[test]
    fn cohort_key_is_minimum_period(
        events in events_strategy(),
        granularity in granularity_strategy(),
    ) {
        let keys = builder(Aggregation::CountDistinct, granularity).cohort_keys(&events).unwrap();
        let reference = reference_periods(&events, granularity);
        prop_assert_eq!(keys.len(), reference.len());
        for (customer, periods) in reference {
            prop_assert_eq!(Some(&keys[&customer]), periods.first());
        }
    }

    #[test]
    fn distinct_baseline_is_cohort_size(
        events in events_strategy(),
        granularity in granularity_strategy(),
    ) {
        let b = builder(Aggregation::CountDistinct, granularity);
        let keys = b.cohort_keys(&events).unwrap();
        let matrix = b.build(&events).unwrap();

        let mut sizes: BTreeMap<Period, usize> = BTreeMap::new();
        for cohort in keys.values() {
            *sizes.entry(*cohort).or_default() += 1;
        }
        for col in matrix.columns() {
            prop_assert_eq!(col.baseline, sizes[&col.cohort] as f64);
        }
    }

    #[test]
    fn rebuilding_is_bit_identical(
        events in events_strategy(),
        agg in aggregation_strategy(),
        granularity in granularity_strategy(),
    ) {
        let b = builder(agg, granularity);
        let first = b.build(&events).unwrap();
        let second = b.build(&events).unwrap();
        prop_assert_eq!(first.cohort_count(), second.cohort_count());
        for (x, y) in first.columns().iter().zip(second.columns()) {
            let xs: Vec<u64> = x.ratios.iter().map(|v| v.to_bits()).collect();
            let ys: Vec<u64> = y.ratios.iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(xs, ys);
        }
    }
}
