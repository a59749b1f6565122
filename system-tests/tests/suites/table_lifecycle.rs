// system-tests/tests/suites/table_lifecycle.rs
// ============================================================================
// Module: Table Lifecycle Tests
// Description: Create, readiness, and delete behavior against DynamoDB.
// Purpose: Ensure table management converges on a real endpoint.
// Dependencies: system-tests helpers
// ============================================================================

//! Table lifecycle system tests.

use helpers::infra::DynamoDbFixture;
use perf_tracker_store_dynamodb::BackendErrorKind;
use perf_tracker_store_dynamodb::CapacityMode;
use perf_tracker_store_dynamodb::StoreSettings;
use perf_tracker_store_dynamodb::TableBackend;
use perf_tracker_store_dynamodb::TableStatus;

use crate::helpers;

#[test]
fn ensure_table_creates_active_table() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let client = fixture.client()?;
    let guard = fixture.guarded_table("ensure")?;
    let table = guard.table();

    if client.table_exists(table)? {
        return Err("fresh table name already exists".into());
    }
    client.ensure_table(table)?;
    if !client.table_exists(table)? {
        return Err("table missing after ensure_table".into());
    }
    if client.backend().describe_table(table)? != TableStatus::Active {
        return Err("table not active after ensure_table".into());
    }

    client.ensure_table(table)?;
    client.delete_table(table)?;
    Ok(())
}

#[test]
fn on_demand_tables_become_active() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let settings = StoreSettings {
        capacity: CapacityMode::OnDemand,
        ..fixture.settings()
    };
    let client = fixture.client_with(settings)?;
    let guard = fixture.guarded_table("on-demand")?;
    let table = guard.table();

    client.ensure_table(table)?;
    if !client.table_exists(table)? {
        return Err("on-demand table missing".into());
    }
    client.delete_table(table)?;
    Ok(())
}

#[test]
fn delete_if_exists_reports_presence() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let client = fixture.client()?;
    let guard = fixture.guarded_table("delete")?;
    let table = guard.table();

    if client.delete_table_if_exists(table)? {
        return Err("missing table reported as deleted".into());
    }
    client.ensure_table(table)?;
    if !client.delete_table_if_exists(table)? {
        return Err("existing table not deleted".into());
    }
    Ok(())
}

#[test]
fn describe_missing_table_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let client = fixture.client()?;
    let table = fixture.unique_table("missing")?;

    match client.backend().describe_table(&table) {
        Err(err) if err.kind == BackendErrorKind::NotFound => Ok(()),
        Err(err) => Err(format!("expected not found, got {err}").into()),
        Ok(_) => Err("missing table described as present".into()),
    }
}

#[test]
fn dropped_guard_removes_table() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = DynamoDbFixture::start()?;
    let client = fixture.client()?;
    let guard = fixture.guarded_table("guard")?;
    let table = guard.table().clone();

    client.ensure_table(&table)?;
    drop(guard);
    if client.table_exists(&table)? {
        return Err("table survived its guard".into());
    }
    Ok(())
}
