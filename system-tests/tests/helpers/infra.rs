// system-tests/tests/helpers/infra.rs
// ============================================================================
// Module: System Test Infrastructure
// Description: DynamoDB fixtures for store system-tests.
// Purpose: Provide an isolated DynamoDB endpoint and per-test table names.
// Dependencies: testcontainers, perf-tracker-store-dynamodb
// ============================================================================

//! ## Overview
//! Starts `amazon/dynamodb-local` through testcontainers unless
//! `PERF_TRACKER_SYSTEM_DYNAMODB_ENDPOINT` points at an existing endpoint.
//! The store client is blocking, so the synchronous runner is used.
//! [`TableGuard`] deletes its table when dropped, including when a test
//! returns early with an error.

use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use perf_tracker_store_dynamodb::DynamoDbBackend;
use perf_tracker_store_dynamodb::DynamoDbConfig;
use perf_tracker_store_dynamodb::MetricStoreClient;
use perf_tracker_store_dynamodb::ReadinessPolicy;
use perf_tracker_store_dynamodb::RetryPolicy;
use perf_tracker_store_dynamodb::StoreSettings;
use perf_tracker_store_dynamodb::TableName;
use system_tests::config::SystemTestConfig;
use testcontainers::Container;
use testcontainers::GenericImage;
use testcontainers::core::IntoContainerPort;
use testcontainers::core::WaitFor;
use testcontainers::runners::SyncRunner;

/// Port `DynamoDB` Local listens on inside the container.
const DYNAMODB_PORT: u16 = 8000;
/// Poll interval used while waiting for tables.
const READINESS_POLL: Duration = Duration::from_millis(200);
/// Readiness bound when no override is configured.
const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(30);

/// Distinguishes tables created within one process.
static TABLE_COUNTER: AtomicU32 = AtomicU32::new(0);

pub struct DynamoDbFixture {
    pub endpoint: String,
    pub config: SystemTestConfig,
    _container: Option<Container<GenericImage>>,
}

impl DynamoDbFixture {
    pub fn start() -> Result<Self, String> {
        let config = SystemTestConfig::load()?;
        super::env::install_local_credentials(&config.region);

        if let Some(endpoint) = config.dynamodb_endpoint.clone() {
            return Ok(Self {
                endpoint,
                config,
                _container: None,
            });
        }

        ensure_docker_available()?;
        let container = GenericImage::new("amazon/dynamodb-local", "latest")
            .with_exposed_port(DYNAMODB_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Initializing DynamoDB Local"))
            .start()
            .map_err(|err| format!("failed to start dynamodb-local container: {err}"))?;
        let port = container
            .get_host_port_ipv4(DYNAMODB_PORT.tcp())
            .map_err(|err| format!("failed to resolve dynamodb-local port: {err}"))?;
        Ok(Self {
            endpoint: format!("http://127.0.0.1:{port}"),
            config,
            _container: Some(container),
        })
    }

    pub fn dynamodb_config(&self) -> DynamoDbConfig {
        DynamoDbConfig {
            region: Some(self.config.region.clone()),
            endpoint: Some(self.endpoint.clone()),
        }
    }

    pub fn settings(&self) -> StoreSettings {
        let timeout = self.config.timeout.unwrap_or(DEFAULT_READINESS_TIMEOUT);
        let polls = timeout.as_millis() / READINESS_POLL.as_millis();
        StoreSettings {
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(50),
                max_delay: Duration::from_millis(500),
            },
            readiness: ReadinessPolicy {
                poll_interval: READINESS_POLL,
                max_polls: u32::try_from(polls).unwrap_or(u32::MAX).max(1),
            },
            ..StoreSettings::default()
        }
    }

    pub fn client(&self) -> Result<MetricStoreClient<DynamoDbBackend>, String> {
        self.client_with(self.settings())
    }

    pub fn client_with(
        &self,
        settings: StoreSettings,
    ) -> Result<MetricStoreClient<DynamoDbBackend>, String> {
        let backend = DynamoDbBackend::new(&self.dynamodb_config())
            .map_err(|err| format!("failed to build dynamodb backend: {err}"))?;
        Ok(MetricStoreClient::new(backend, settings))
    }

    /// Returns a table name no other test in this run will use.
    pub fn unique_table(&self, label: &str) -> Result<TableName, String> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| format!("clock drift: {err}"))?
            .as_nanos();
        let sequence = TABLE_COUNTER.fetch_add(1, Ordering::Relaxed);
        TableName::new(format!("{}-{label}-{nanos}-{sequence}", self.config.table_prefix))
            .map_err(|err| err.to_string())
    }

    /// Returns a unique table name that is deleted when the guard drops.
    pub fn guarded_table(&self, label: &str) -> Result<TableGuard, String> {
        Ok(TableGuard {
            client: self.client()?,
            table: self.unique_table(label)?,
        })
    }
}

/// Deletes its table, if present, on drop.
pub struct TableGuard {
    client: MetricStoreClient<DynamoDbBackend>,
    table: TableName,
}

impl TableGuard {
    pub const fn table(&self) -> &TableName {
        &self.table
    }
}

impl Drop for TableGuard {
    fn drop(&mut self) {
        let _ = self.client.delete_table_if_exists(&self.table);
    }
}

fn ensure_docker_available() -> Result<(), String> {
    let output = std::process::Command::new("docker")
        .arg("info")
        .output()
        .map_err(|err| format!("docker info failed: {err}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("docker info failed: {stderr}"));
    }
    Ok(())
}
