// crates/perf-tracker-core/tests/aggregation.rs
// ============================================================================
// Module: Aggregation Tests
// Description: Collector document parsing and metric aggregation behavior.
// Purpose: Ensure records carry correct statistics and degenerate input fails.
// Dependencies: perf-tracker-core, serde_json
// ============================================================================

//! ## Overview
//! Exercises the aggregator end to end: parsing, statistics, label handling,
//! and the abort-the-record policy for invalid metrics.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    missing_docs,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use perf_tracker_core::AggregateError;
use perf_tracker_core::AggregationSettings;
use perf_tracker_core::Aggregator;
use perf_tracker_core::BuildHash;
use perf_tracker_core::BuildIdentity;
use perf_tracker_core::CollectorDocument;
use perf_tracker_core::RawMetricSample;
use perf_tracker_core::SpreadFormula;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn identity(hash: &str) -> BuildIdentity {
    BuildIdentity::new(BuildHash::new(hash).expect("build hash"), None)
}

fn sample(label: &str, values: &[f64]) -> RawMetricSample {
    RawMetricSample {
        id: format!("id-{label}"),
        label: label.to_string(),
        messages: String::new(),
        status_code: "Complete".to_string(),
        timestamps: (0 .. values.len()).map(|idx| format!("t{idx}")).collect(),
        values: values.to_vec(),
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn cpu_document_yields_average_and_period() {
    let bytes = br#"[{"Label":"cpu","Timestamps":["t1","t2"],"Values":[10,20]}]"#;
    let record = Aggregator::default().aggregate_bytes(bytes, &identity("abc123")).expect("record");

    assert_eq!(record.build_hash.as_str(), "abc123");
    assert_eq!(record.commit_date, None);
    let cpu = record.metric("cpu").expect("cpu metric");
    assert_close(cpu.average, 15.0);
    assert_eq!(cpu.period_seconds, 150);
    assert_eq!(cpu.raw_samples, vec![10.0, 20.0]);
}

#[test]
fn statistics_are_computed_from_data() {
    let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    let metric = Aggregator::default().aggregate_metric(&sample("mem", &values)).expect("metric");

    assert_close(metric.average, 5.0);
    assert_close(metric.spread, 2.0);
    assert_eq!(metric.min, 2.0);
    assert_eq!(metric.max, 9.0);
    assert_eq!(metric.p99, 9.0);
    assert_eq!(metric.period_seconds, 37);
}

#[test]
fn legacy_spread_formula_is_opt_in() {
    let settings = AggregationSettings {
        spread: SpreadFormula::LegacySummedDeviation,
        ..AggregationSettings::default()
    };
    let metric = Aggregator::new(settings)
        .aggregate_metric(&sample("mem", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]))
        .expect("metric");
    assert_close(metric.spread, 0.0);
}

#[test]
fn empty_values_fail_with_label() {
    let bytes = br#"[
        {"Label":"cpu","Timestamps":["t1"],"Values":[1]},
        {"Label":"disk","Timestamps":[],"Values":[]}
    ]"#;
    let err = Aggregator::default().aggregate_bytes(bytes, &identity("abc123")).unwrap_err();
    match err {
        AggregateError::InvalidInput {
            label,
            reason,
        } => {
            assert_eq!(label, "disk");
            assert!(reason.contains("no samples"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn mismatched_timestamps_fail() {
    let mut raw = sample("net", &[1.0, 2.0]);
    raw.timestamps.pop();
    let err = Aggregator::default().aggregate_metric(&raw).unwrap_err();
    assert!(matches!(err, AggregateError::InvalidInput { ref label, .. } if label == "net"));
}

#[test]
fn malformed_document_is_parse_error() {
    let aggregator = Aggregator::default();
    let err = aggregator.parse_document(br#"{"Label":"cpu"}"#).unwrap_err();
    assert!(matches!(err, AggregateError::Parse(_)));
    let err = aggregator.parse_document(br#"[{"Label":"cpu","Values":"x"}]"#).unwrap_err();
    assert!(matches!(err, AggregateError::Parse(_)));
}

#[test]
fn optional_collector_fields_default_to_empty() {
    let document = Aggregator::default()
        .parse_document(br#"[{"Label":"cpu","Timestamps":["a"],"Values":[3.5],"Extra":1}]"#)
        .expect("document");
    let entry = &document.samples()[0];
    assert_eq!(entry.id, "");
    assert_eq!(entry.messages, "");
    assert_eq!(entry.status_code, "");
}

#[test]
fn duplicate_labels_keep_last_entry() {
    let document = CollectorDocument(vec![sample("cpu", &[1.0]), sample("cpu", &[3.0, 5.0])]);
    let record = Aggregator::default().aggregate(&document, &identity("h")).expect("record");
    assert_eq!(record.metrics.len(), 1);
    assert_close(record.metric("cpu").expect("cpu").average, 4.0);
}

#[test]
fn reserved_and_empty_labels_are_rejected() {
    for label in ["Hash", "CommitDate", "IsRelease", ""] {
        let document = CollectorDocument(vec![sample(label, &[1.0])]);
        let err = Aggregator::default().aggregate(&document, &identity("h")).unwrap_err();
        assert!(
            matches!(err, AggregateError::InvalidInput { .. }),
            "label {label:?} should be rejected"
        );
    }
}

#[test]
fn large_finite_samples_keep_finite_statistics() {
    let metric = Aggregator::default().aggregate_metric(&sample("huge", &[1e308, 1e308])).unwrap();
    assert_eq!(metric.average, 1e308);
    assert_eq!(metric.spread, 0.0);

    let metric =
        Aggregator::default().aggregate_metric(&sample("wide", &[f64::MAX, -f64::MAX])).unwrap();
    assert_eq!(metric.average, 0.0);
    assert_eq!(metric.spread, f64::MAX);
}

#[test]
fn average_stays_within_extrema_up_to_rounding() {
    let metric = Aggregator::default().aggregate_metric(&sample("cpu", &[0.1, 0.1, 0.1])).unwrap();
    assert_eq!(metric.min, 0.1);
    assert_eq!(metric.max, 0.1);
    assert_close(metric.average, 0.1);
    assert!(metric.average >= metric.min - f64::EPSILON);
    assert!(metric.average <= metric.max + f64::EPSILON);
}

#[test]
fn sample_limit_is_enforced() {
    let settings = AggregationSettings {
        max_samples_per_metric: 2,
        ..AggregationSettings::default()
    };
    let err =
        Aggregator::new(settings).aggregate_metric(&sample("cpu", &[1.0, 2.0, 3.0])).unwrap_err();
    assert!(matches!(err, AggregateError::InvalidInput { .. }));
}

#[test]
fn metric_limit_is_enforced() {
    let settings = AggregationSettings {
        max_metrics: 1,
        ..AggregationSettings::default()
    };
    let bytes = br#"[
        {"Label":"a","Timestamps":["t"],"Values":[1]},
        {"Label":"b","Timestamps":["t"],"Values":[1]}
    ]"#;
    let err = Aggregator::new(settings).parse_document(bytes).unwrap_err();
    assert!(matches!(err, AggregateError::TooLarge(_)));
}

#[test]
fn commit_date_is_carried_into_record() {
    let identity = BuildIdentity::new(
        BuildHash::new("abc123").expect("hash"),
        Some("2022-06-01T00:00:00Z".to_string()),
    );
    let record = Aggregator::default()
        .aggregate(&CollectorDocument(vec![sample("cpu", &[1.0])]), &identity)
        .expect("record");
    assert_eq!(record.commit_date.as_deref(), Some("2022-06-01T00:00:00Z"));
    assert!(!record.is_release);
}

#[test]
fn record_json_uses_persisted_field_names() {
    let record = Aggregator::default()
        .aggregate(&CollectorDocument(vec![sample("cpu", &[1.0, 3.0])]), &identity("abc"))
        .expect("record");
    let json = serde_json::to_value(&record).expect("json");
    assert_eq!(json["Hash"], "abc");
    assert!(json.get("CommitDate").is_none());
    assert!(json.get("IsRelease").is_none());
    assert!(json.get("Metrics").is_none());
    assert_eq!(json["cpu"]["Average"], 2.0);
    assert_eq!(json["cpu"]["Period"], 150);

    let restored: perf_tracker_core::MetricRecord = serde_json::from_value(json).expect("decode");
    assert_eq!(restored, record);
}
