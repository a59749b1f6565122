// system-tests/tests/suites/transmit.rs
// ============================================================================
// Module: Transmit Pipeline Tests
// Description: Collector document upload through the transmitter.
// Purpose: Ensure aggregation output lands in DynamoDB under the build hash.
// Dependencies: system-tests helpers
// ============================================================================

//! Transmit pipeline system tests.

use std::sync::Arc;

use helpers::infra::DynamoDbFixture;
use perf_tracker_core::AggregateError;
use perf_tracker_core::Aggregator;
use perf_tracker_core::BuildHash;
use perf_tracker_core::BuildIdentity;
use perf_tracker_store_dynamodb::FileStoreEventSink;
use perf_tracker_store_dynamodb::TransmitError;
use perf_tracker_store_dynamodb::Transmitter;
use serde_json::Value;
use tempfile::TempDir;

use crate::helpers;

const DOCUMENT: &[u8] = br#"[
    {"Id":"m1","Label":"cpu","Messages":"","StatusCode":"Complete",
     "Timestamps":["2022-06-01T00:00:00Z","2022-06-01T00:01:00Z"],"Values":[10,20]},
    {"Id":"m2","Label":"mem","Messages":"","StatusCode":"Complete",
     "Timestamps":["2022-06-01T00:00:00Z"],"Values":[512]}
]"#;

#[test]
fn document_is_aggregated_and_stored() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let temp = TempDir::new()?;
    let log_path = temp.path().join("store-events.jsonl");
    let client =
        fixture.client()?.with_event_sink(Arc::new(FileStoreEventSink::new(&log_path)?));
    let guard = fixture.guarded_table("transmit")?;
    let transmitter = Transmitter::new(Aggregator::default(), client, guard.table().clone());

    let identity = BuildIdentity::new(BuildHash::new("abc123")?, Some("1654041600".to_string()));
    let id = transmitter.send_document(DOCUMENT, &identity)?;
    let stored = transmitter
        .client()
        .get_record(transmitter.table(), &id.build_hash)?
        .ok_or("record not found")?;
    let cpu = stored.metric("cpu").ok_or("cpu metric missing")?;
    if (cpu.average - 15.0).abs() > f64::EPSILON || cpu.period_seconds != 150 {
        return Err("cpu summary not persisted".into());
    }
    if stored.metric("mem").is_none() || stored.commit_date.as_deref() != Some("1654041600") {
        return Err("record content incomplete".into());
    }

    transmitter.tag_release(&id.build_hash)?;
    if !transmitter.remove_table()? {
        return Err("table not removed".into());
    }

    let events: Vec<String> = std::fs::read_to_string(&log_path)?
        .lines()
        .map(|line| serde_json::from_str::<Value>(line))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter_map(|event| event["event"].as_str().map(str::to_string))
        .collect();
    for expected in ["table_missing", "table_ready", "record_written", "release_tagged"] {
        if !events.iter().any(|event| event == expected) {
            return Err(format!("event log missing {expected}").into());
        }
    }
    Ok(())
}

#[test]
fn invalid_document_leaves_table_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let guard = fixture.guarded_table("invalid")?;
    let transmitter =
        Transmitter::new(Aggregator::default(), fixture.client()?, guard.table().clone());

    let bytes = br#"[{"Label":"cpu","Timestamps":["t1"],"Values":[]}]"#;
    let identity = BuildIdentity::new(BuildHash::new("abc123")?, None);
    match transmitter.send_document(bytes, &identity) {
        Err(TransmitError::Aggregate(AggregateError::InvalidInput {
            ..
        })) => {}
        Err(err) => return Err(format!("expected invalid input, got {err}").into()),
        Ok(_) => return Err("invalid document was stored".into()),
    }
    if transmitter.client().table_exists(transmitter.table())? {
        return Err("table created for a rejected document".into());
    }
    Ok(())
}
