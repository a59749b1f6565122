// system-tests/tests/suites/record_persistence.rs
// ============================================================================
// Module: Record Persistence Tests
// Description: Record writes, reads, and release tagging against DynamoDB.
// Purpose: Ensure the persisted item layout survives a real store round trip.
// Dependencies: system-tests helpers
// ============================================================================

//! Record persistence system tests.

use helpers::infra::DynamoDbFixture;
use perf_tracker_core::AggregatedMetric;
use perf_tracker_core::BuildHash;
use perf_tracker_core::BuildIdentity;
use perf_tracker_core::MetricLabel;
use perf_tracker_core::MetricRecord;

use crate::helpers;

fn record(hash: &str, average: f64) -> Result<MetricRecord, Box<dyn std::error::Error>> {
    let identity =
        BuildIdentity::new(BuildHash::new(hash)?, Some("1654041600".to_string()));
    let mut record = MetricRecord::new(&identity);
    record.insert(
        MetricLabel::new("cpu_usage")?,
        AggregatedMetric {
            average,
            spread: 0.25,
            max: 12.5,
            min: 1.0e-9,
            p99: 12.5,
            period_seconds: 60,
            raw_samples: vec![1.0e-9, average, 12.5, 7.0e20],
        },
    );
    Ok(record)
}

#[test]
fn stored_record_reads_back_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let client = fixture.client()?;
    let guard = fixture.guarded_table("records")?;
    let table = guard.table();
    client.ensure_table(table)?;

    let original = record("abc123", 6.75)?;
    let id = client.put_record(table, &original)?;
    let stored = client.get_record(table, &id.build_hash)?.ok_or("record not found")?;
    if stored != original {
        return Err("stored record differs from the written record".into());
    }

    let absent = client.get_record(table, &BuildHash::new("never-written")?)?;
    if absent.is_some() {
        return Err("unknown hash returned a record".into());
    }

    Ok(())
}

#[test]
fn rewriting_a_build_replaces_the_item() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let client = fixture.client()?;
    let guard = fixture.guarded_table("overwrite")?;
    let table = guard.table();
    client.ensure_table(table)?;

    client.put_record(table, &record("def456", 3.0)?)?;
    let replacement = record("def456", 9.0)?;
    let id = client.put_record(table, &replacement)?;
    let stored = client.get_record(table, &id.build_hash)?.ok_or("record not found")?;
    if stored != replacement {
        return Err("last write did not win".into());
    }

    Ok(())
}

#[test]
fn release_tag_requires_existing_record() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let client = fixture.client()?;
    let guard = fixture.guarded_table("release")?;
    let table = guard.table();
    client.ensure_table(table)?;

    match client.tag_release(table, &BuildHash::new("missing")?) {
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(format!("expected not found, got {err}").into()),
        Ok(()) => return Err("tagged a build that was never written".into()),
    }

    let id = client.put_record(table, &record("ghi789", 4.0)?)?;
    client.tag_release(table, &id.build_hash)?;
    let stored = client.get_record(table, &id.build_hash)?.ok_or("record not found")?;
    if !stored.is_release {
        return Err("release flag not persisted".into());
    }

    Ok(())
}
