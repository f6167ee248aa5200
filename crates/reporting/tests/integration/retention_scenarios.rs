//! End-to-end retention scenarios against the public API.

use cohort_core::{CohortConfig, CohortError, Event, Granularity};
use cohort_reporting::{Aggregation, CohortBuilder, CohortReport, MatrixSink, TerminalDisplay};

fn order(id: &str, at: &str, amount: f64) -> Event {
    Event::new(id, at).with_attribute("amount", amount)
}

#[test]
fn test_two_customers_retention_halves() {
    let events = vec![
        Event::new("X", "2023-01-02 09:15:00"),
        Event::new("Y", "2023-01-28 17:40:00"),
        Event::new("X", "2023-02-03 11:00:00"),
    ];
    let matrix = CohortBuilder::new(Aggregation::CountDistinct).build(&events).unwrap();

    let col = matrix.column_by_label("2023-01").unwrap();
    assert_eq!(col.aggregates, vec![2.0, 1.0]);
    assert_eq!(col.ratios, vec![1.0, 0.5]);
}

#[test]
fn test_single_customer_single_event() {
    let matrix = CohortBuilder::new(Aggregation::CountDistinct)
        .build(&[Event::new("only", "2022-11-30")])
        .unwrap();
    assert_eq!(matrix.cohort_count(), 1);
    assert_eq!(matrix.max_index(), 1);
    assert_eq!(matrix.row(1), vec![Some(1.0)]);
}

#[test]
fn test_median_rejected_before_grouping() {
    // The events are invalid too; the strategy check must win.
    let config = CohortConfig {
        aggregation: "median".into(),
        ..Default::default()
    };
    let events = vec![Event::new("a", "not-a-date"), Event::anonymous("2023-01-01")];
    let err = CohortBuilder::from_config(&config)
        .and_then(|builder| builder.build(&events))
        .unwrap_err();
    assert!(matches!(err, CohortError::UnsupportedAggregation(ref name) if name == "median"));

    let dir = tempfile::tempdir().unwrap();
    let config = CohortConfig {
        output_dir: dir.path().join("out"),
        ..config
    };

    let err = CohortReport::new(config).err().unwrap();
    assert!(matches!(err, CohortError::UnsupportedAggregation(_)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_zero_sum_baseline() {
    let events = vec![order("a", "2023-04-01", 0.0), order("b", "2023-04-09", 0.0)];
    let err = CohortBuilder::new(Aggregation::Sum)
        .with_metric_field("amount")
        .build(&events)
        .unwrap_err();
    assert!(matches!(err, CohortError::ZeroBaselineCohort { cohort } if cohort.label() == "2023-04"));
}

#[test]
fn test_zero_baseline_only_in_one_cohort_still_fails() {
    let events = vec![
        order("a", "2023-01-01", 10.0),
        order("a", "2023-02-01", 5.0),
        order("b", "2023-03-01", 0.0),
        order("b", "2023-04-01", 8.0),
    ];
    let err = CohortBuilder::new(Aggregation::Sum)
        .with_metric_field("amount")
        .build(&events)
        .unwrap_err();
    assert!(matches!(err, CohortError::ZeroBaselineCohort { cohort } if cohort.label() == "2023-03"));
}

#[test]
fn test_revenue_retention_by_quarter() {
    let events = vec![
        order("a", "2023-01-15", 40.0),
        order("b", "2023-02-20", 60.0),
        order("a", "2023-05-01", 25.0),
        order("c", "2023-04-10", 80.0),
        order("b", "2023-10-12", 50.0),
        order("c", "2023-11-30", 20.0),
    ];
    let matrix = CohortBuilder::new(Aggregation::Sum)
        .with_metric_field("amount")
        .with_granularity(Granularity::Quarter)
        .build(&events)
        .unwrap();

    let q1 = matrix.column_by_label("2023-Q1").unwrap();
    // Q1, Q2, Q4 observed; Q3 had no activity and takes no index.
    assert_eq!(
        q1.periods.iter().map(|p| p.label()).collect::<Vec<_>>(),
        vec!["2023-Q1", "2023-Q2", "2023-Q4"]
    );
    assert_eq!(q1.aggregates, vec![100.0, 25.0, 50.0]);
    assert_eq!(q1.ratios, vec![1.0, 0.25, 0.5]);

    let q2 = matrix.column_by_label("2023-Q2").unwrap();
    assert_eq!(q2.ratios, vec![1.0, 0.25]);
    assert_eq!(matrix.max_index(), 3);
}

#[test]
fn test_count_distinct_on_text_attribute() {
    let events = vec![
        Event::new("a", "2023-01-01").with_attribute("sku", "red"),
        Event::new("b", "2023-01-02").with_attribute("sku", "blue"),
        Event::new("a", "2023-01-03").with_attribute("sku", "red"),
        Event::new("b", "2023-02-01").with_attribute("sku", "red"),
    ];
    let matrix = CohortBuilder::new(Aggregation::CountDistinct)
        .with_metric_field("sku")
        .build(&events)
        .unwrap();
    assert_eq!(matrix.columns()[0].aggregates, vec![2.0, 1.0]);
}

#[test]
fn test_sum_over_text_is_rejected() {
    let events = vec![Event::new("a", "2023-01-01").with_attribute("amount", "12.50")];
    let err = CohortBuilder::new(Aggregation::Mean)
        .with_metric_field("amount")
        .build(&events)
        .unwrap_err();
    assert!(matches!(err, CohortError::NonNumericMetric { row: 0, .. }));
}

#[test]
fn test_builder_is_idempotent() {
    let events: Vec<Event> = (0..60)
        .map(|i| order(&format!("c{}", i % 7), &format!("2023-{:02}-{:02}", i % 12 + 1, i % 28 + 1), 0.1 * i as f64 + 1.0))
        .collect();
    let builder = CohortBuilder::new(Aggregation::Mean).with_metric_field("amount");
    let first = builder.build(&events).unwrap();
    let second = builder.build(&events).unwrap();

    for (a, b) in first.columns().iter().zip(second.columns()) {
        let bits_a: Vec<u64> = a.ratios.iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u64> = b.ratios.iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }
    assert_eq!(first, second);
}

#[test]
fn test_events_from_json() {
    let json = r#"[
        {"customer_id": "a", "occurred_at": "2023-01-05T10:00:00Z", "attributes": {"amount": 10}},
        {"customer_id": "a", "occurred_at": "2023-02-05T10:00:00Z", "attributes": {"amount": 4}},
        {"customer_id": null, "occurred_at": "2023-02-06T10:00:00Z"}
    ]"#;
    let events: Vec<Event> = serde_json::from_str(json).unwrap();

    let err = CohortBuilder::new(Aggregation::Sum)
        .with_metric_field("amount")
        .build(&events)
        .unwrap_err();
    assert!(matches!(err, CohortError::MissingIdentifier { row: 2 }));

    let matrix = CohortBuilder::new(Aggregation::Sum)
        .with_metric_field("amount")
        .build(&events[..2])
        .unwrap();
    assert_eq!(matrix.columns()[0].ratios, vec![1.0, 0.4]);
}

#[test]
fn test_terminal_display_sink() {
    let matrix = CohortBuilder::new(Aggregation::CountDistinct)
        .build(&[
            Event::new("a", "2023-01-01"),
            Event::new("b", "2023-02-01"),
            Event::new("a", "2023-03-01"),
        ])
        .unwrap();
    let display = TerminalDisplay::new(Vec::new());
    display.consume(&matrix).unwrap();
    let text = String::from_utf8(display.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[2].starts_with("2023-02"));
}
