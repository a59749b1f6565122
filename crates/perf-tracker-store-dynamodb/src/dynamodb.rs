// crates/perf-tracker-store-dynamodb/src/dynamodb.rs
// ============================================================================
// Module: DynamoDB Table Backend
// Description: AWS SDK-backed table backend with a private Tokio runtime.
// Purpose: Serve blocking store calls against DynamoDB or DynamoDB Local.
// Dependencies: aws-config, aws-sdk-dynamodb, tokio
// ============================================================================

//! ## Overview
//! [`DynamoDbBackend`] wraps the async AWS SDK client behind the blocking
//! [`TableBackend`] interface. It owns a multi-thread Tokio runtime; when a
//! call is made from inside another runtime the future is driven on that
//! runtime instead. SDK failures are classified by error code so the store
//! client can tell throttling and network failures from permanent ones.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::error::ProvideErrorMetadata;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::AttributeDefinition;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::types::BillingMode;
use aws_sdk_dynamodb::types::KeySchemaElement;
use aws_sdk_dynamodb::types::KeyType;
use aws_sdk_dynamodb::types::ProvisionedThroughput;
use aws_sdk_dynamodb::types::ScalarAttributeType;
use perf_tracker_core::BuildHash;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;
use tokio::runtime::RuntimeFlavor;

use crate::backend::BackendError;
use crate::backend::BackendErrorKind;
use crate::backend::CapacityMode;
use crate::backend::HASH_KEY_ATTRIBUTE;
use crate::backend::Item;
use crate::backend::TableBackend;
use crate::backend::TableName;
use crate::backend::TableSpec;
use crate::backend::TableStatus;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Connection settings for the `DynamoDB` backend.
///
/// Credentials always come from the AWS default provider chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamoDbConfig {
    /// Region override; the provider chain decides when unset.
    pub region: Option<String>,
    /// Endpoint override, e.g. a `DynamoDB` Local URL.
    pub endpoint: Option<String>,
}

// ============================================================================
// SECTION: Runtime Helpers
// ============================================================================

/// Blocks on a backend future using a compatible runtime.
fn block_on_with_runtime<F, T>(runtime: &Runtime, future: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) {
            return tokio::task::block_in_place(|| handle.block_on(future));
        }
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let result = Runtime::new()
                .map_err(|err| BackendError::other(err.to_string()))
                .and_then(|runtime| runtime.block_on(future));
            let _ = tx.send(result);
        });
        return rx
            .recv()
            .unwrap_or_else(|_| Err(BackendError::other("dynamodb thread join failed")));
    }

    runtime.block_on(future)
}

// ============================================================================
// SECTION: Backend
// ============================================================================

/// `DynamoDB`-backed [`TableBackend`].
pub struct DynamoDbBackend {
    /// Underlying SDK client.
    client: Client,
    /// Tokio runtime for blocking SDK operations.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for DynamoDbBackend {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

impl DynamoDbBackend {
    /// Builds a backend from the AWS default configuration chain plus the
    /// given overrides.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the runtime cannot be started.
    pub fn new(config: &DynamoDbConfig) -> Result<Self, BackendError> {
        let runtime = Runtime::new().map_err(|err| BackendError::other(err.to_string()))?;
        let region = config.region.clone();
        let endpoint = config.endpoint.clone();
        let shared_config = block_on_with_runtime(&runtime, async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = region {
                loader = loader.region(Region::new(region));
            }
            if let Some(endpoint) = endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            Ok(loader.load().await)
        })?;
        let client = Client::new(&shared_config);
        Ok(Self {
            client,
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Returns the runtime or an error if shut down.
    fn runtime(&self) -> Result<&Runtime, BackendError> {
        self.runtime
            .as_ref()
            .map(AsRef::as_ref)
            .ok_or_else(|| BackendError::other("dynamodb runtime closed"))
    }
}

impl TableBackend for DynamoDbBackend {
    fn describe_table(&self, table: &TableName) -> Result<TableStatus, BackendError> {
        let client = self.client.clone();
        let table = table.as_str().to_string();
        block_on_with_runtime(self.runtime()?, async move {
            let output = client
                .describe_table()
                .table_name(table)
                .send()
                .await
                .map_err(|err| classify(&err))?;
            let status = output
                .table()
                .and_then(|description| description.table_status())
                .map_or_else(|| TableStatus::Other("UNKNOWN".to_string()), map_status);
            Ok(status)
        })
    }

    fn create_table(&self, spec: &TableSpec) -> Result<(), BackendError> {
        let key_attribute = AttributeDefinition::builder()
            .attribute_name(HASH_KEY_ATTRIBUTE)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(build_error)?;
        let key_schema = KeySchemaElement::builder()
            .attribute_name(HASH_KEY_ATTRIBUTE)
            .key_type(KeyType::Hash)
            .build()
            .map_err(build_error)?;
        let mut request = self
            .client
            .create_table()
            .table_name(spec.name.as_str())
            .attribute_definitions(key_attribute)
            .key_schema(key_schema);
        request = match spec.capacity {
            CapacityMode::Provisioned {
                read_units,
                write_units,
            } => {
                let throughput = ProvisionedThroughput::builder()
                    .read_capacity_units(read_units)
                    .write_capacity_units(write_units)
                    .build()
                    .map_err(build_error)?;
                request.billing_mode(BillingMode::Provisioned).provisioned_throughput(throughput)
            }
            CapacityMode::OnDemand => request.billing_mode(BillingMode::PayPerRequest),
        };
        block_on_with_runtime(self.runtime()?, async move {
            request.send().await.map_err(|err| classify(&err))?;
            Ok(())
        })
    }

    fn delete_table(&self, table: &TableName) -> Result<(), BackendError> {
        let client = self.client.clone();
        let table = table.as_str().to_string();
        block_on_with_runtime(self.runtime()?, async move {
            client.delete_table().table_name(table).send().await.map_err(|err| classify(&err))?;
            Ok(())
        })
    }

    fn put_item(&self, table: &TableName, item: Item) -> Result<(), BackendError> {
        let client = self.client.clone();
        let table = table.as_str().to_string();
        block_on_with_runtime(self.runtime()?, async move {
            client
                .put_item()
                .table_name(table)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|err| classify(&err))?;
            Ok(())
        })
    }

    fn get_item(&self, table: &TableName, key: &BuildHash) -> Result<Option<Item>, BackendError> {
        let client = self.client.clone();
        let table = table.as_str().to_string();
        let key = key.as_str().to_string();
        block_on_with_runtime(self.runtime()?, async move {
            let output = client
                .get_item()
                .table_name(table)
                .key(HASH_KEY_ATTRIBUTE, AttributeValue::S(key))
                .consistent_read(true)
                .send()
                .await
                .map_err(|err| classify(&err))?;
            Ok(output.item().cloned())
        })
    }

    fn set_flag(
        &self,
        table: &TableName,
        key: &BuildHash,
        attribute: &str,
        value: bool,
    ) -> Result<(), BackendError> {
        let client = self.client.clone();
        let table = table.as_str().to_string();
        let key = key.as_str().to_string();
        let attribute = attribute.to_string();
        block_on_with_runtime(self.runtime()?, async move {
            client
                .update_item()
                .table_name(table)
                .key(HASH_KEY_ATTRIBUTE, AttributeValue::S(key))
                .update_expression("SET #flag = :value")
                .condition_expression("attribute_exists(#hash)")
                .expression_attribute_names("#flag", attribute)
                .expression_attribute_names("#hash", HASH_KEY_ATTRIBUTE)
                .expression_attribute_values(":value", AttributeValue::Bool(value))
                .send()
                .await
                .map_err(|err| classify(&err))?;
            Ok(())
        })
    }
}

// ============================================================================
// SECTION: Error Classification
// ============================================================================

/// Maps an SDK failure onto a backend error kind.
fn classify<E, R>(err: &SdkError<E, R>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    let kind = match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            BackendErrorKind::Transient
        }
        SdkError::ServiceError(service) => kind_for_code(service.err().code()),
        SdkError::ConstructionFailure(_) => BackendErrorKind::Invalid,
        _ => BackendErrorKind::Other,
    };
    BackendError::new(kind, DisplayErrorContext(err).to_string())
}

/// Maps a `DynamoDB` error code onto a backend error kind.
fn kind_for_code(code: Option<&str>) -> BackendErrorKind {
    match code {
        Some("ResourceNotFoundException") => BackendErrorKind::NotFound,
        Some("ResourceInUseException") => BackendErrorKind::InUse,
        Some("ConditionalCheckFailedException") => BackendErrorKind::ConditionFailed,
        Some(
            "ThrottlingException"
            | "ProvisionedThroughputExceededException"
            | "RequestLimitExceeded"
            | "LimitExceededException"
            | "InternalServerError"
            | "ServiceUnavailable",
        ) => BackendErrorKind::Transient,
        Some("ValidationException") => BackendErrorKind::Invalid,
        _ => BackendErrorKind::Other,
    }
}

/// Maps an SDK table status onto the backend status.
fn map_status(status: &aws_sdk_dynamodb::types::TableStatus) -> TableStatus {
    match status.as_str() {
        "ACTIVE" => TableStatus::Active,
        "CREATING" => TableStatus::Creating,
        "UPDATING" => TableStatus::Updating,
        "DELETING" => TableStatus::Deleting,
        other => TableStatus::Other(other.to_string()),
    }
}

/// Converts an SDK request-builder failure into a backend error.
fn build_error(err: BuildError) -> BackendError {
    BackendError::invalid(err.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn error_codes_map_to_kinds() {
        assert_eq!(kind_for_code(Some("ResourceNotFoundException")), BackendErrorKind::NotFound);
        assert_eq!(kind_for_code(Some("ResourceInUseException")), BackendErrorKind::InUse);
        assert_eq!(
            kind_for_code(Some("ConditionalCheckFailedException")),
            BackendErrorKind::ConditionFailed
        );
        assert_eq!(
            kind_for_code(Some("ProvisionedThroughputExceededException")),
            BackendErrorKind::Transient
        );
        assert_eq!(kind_for_code(Some("AccessDeniedException")), BackendErrorKind::Other);
        assert_eq!(kind_for_code(None), BackendErrorKind::Other);
    }

    #[test]
    fn table_statuses_map_to_lifecycle() {
        use aws_sdk_dynamodb::types::TableStatus as SdkTableStatus;
        assert_eq!(map_status(&SdkTableStatus::Active), TableStatus::Active);
        assert_eq!(map_status(&SdkTableStatus::Creating), TableStatus::Creating);
        assert_eq!(map_status(&SdkTableStatus::Deleting), TableStatus::Deleting);
        assert_eq!(
            map_status(&SdkTableStatus::Archived),
            TableStatus::Other("ARCHIVED".to_string())
        );
    }
}
