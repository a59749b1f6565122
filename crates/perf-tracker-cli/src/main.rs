// crates/perf-tracker-cli/src/main.rs
// ============================================================================
// Module: Performance Tracker CLI Entry Point
// Description: Command dispatcher for aggregation, upload, and table tasks.
// Purpose: Let test pipelines publish collector output with one command.
// Dependencies: clap, perf-tracker-config, perf-tracker-core, perf-tracker-store-dynamodb
// ============================================================================

//! ## Overview
//! The `perf-tracker` binary reads a collector document, reduces it into a
//! per-build record, and writes the record to the metric table. Table
//! lifecycle and release tagging are exposed as separate subcommands so a
//! pipeline can prepare or tear down the table explicitly.
//!
//! Collector documents are untrusted input; reads are bounded before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use perf_tracker_config::PerfTrackerConfig;
use perf_tracker_core::Aggregator;
use perf_tracker_core::BuildIdentity;
use perf_tracker_core::MAX_DOCUMENT_BYTES;
use perf_tracker_store_dynamodb::DynamoDbBackend;
use perf_tracker_store_dynamodb::MetricStoreClient;
use perf_tracker_store_dynamodb::Transmitter;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "perf-tracker", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate a collector document and print the record as JSON.
    Aggregate(DocumentCommand),
    /// Aggregate a collector document and store the record.
    Send(DocumentCommand),
    /// Metric table lifecycle.
    Table {
        /// Selected table subcommand.
        #[command(subcommand)]
        command: TableCommand,
    },
    /// Mark a stored build as a release build.
    TagRelease(TagReleaseCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments shared by commands that consume a collector document.
#[derive(Args, Debug)]
struct DocumentCommand {
    /// Path to the collector JSON document.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Build hash overriding the configured environment variable.
    #[arg(long, value_name = "HASH")]
    hash: Option<String>,
    /// Optional config file path (defaults to perf-tracker.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Table lifecycle subcommands.
#[derive(Subcommand, Debug)]
enum TableCommand {
    /// Create the table when absent and wait until it is active.
    Ensure(StoreCommand),
    /// Print whether the table exists.
    Exists(StoreCommand),
    /// Delete the table when it exists.
    Delete(StoreCommand),
}

/// Arguments shared by commands that only talk to the store.
#[derive(Args, Debug)]
struct StoreCommand {
    /// Optional config file path (defaults to perf-tracker.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `tag-release`.
#[derive(Args, Debug)]
struct TagReleaseCommand {
    /// Build hash to tag (defaults to the configured environment variable).
    #[arg(long, value_name = "HASH")]
    hash: Option<String>,
    /// Optional config file path (defaults to perf-tracker.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to perf-tracker.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying the message printed to stderr.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("perf-tracker {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Aggregate(command) => command_aggregate(&command),
        Commands::Send(command) => command_send(&command),
        Commands::Table {
            command,
        } => command_table(command),
        Commands::TagRelease(command) => command_tag_release(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints the top-level help text.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Document Commands
// ============================================================================

/// Executes `aggregate`.
fn command_aggregate(command: &DocumentCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let identity = resolve_identity(&config, command.hash.as_deref())?;
    let bytes = read_document(&command.input)?;
    let aggregator = Aggregator::new(config.aggregation.settings());
    let record = aggregator
        .aggregate_bytes(&bytes, &identity)
        .map_err(|err| CliError::new(format!("aggregation failed: {err}")))?;
    let rendered = serde_json::to_string_pretty(&record)
        .map_err(|err| CliError::new(format!("failed to render record: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `send`.
fn command_send(command: &DocumentCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let identity = resolve_identity(&config, command.hash.as_deref())?;
    let bytes = read_document(&command.input)?;
    let transmitter = build_transmitter(&config)?;
    let id = transmitter
        .send_document(&bytes, &identity)
        .map_err(|err| CliError::new(format!("send failed: {err}")))?;
    write_stdout_line(&format!("stored build {} in table {}", id.build_hash, id.table))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `tag-release`.
fn command_tag_release(command: &TagReleaseCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let identity = resolve_identity(&config, command.hash.as_deref())?;
    let transmitter = build_transmitter(&config)?;
    transmitter
        .tag_release(&identity.build_hash)
        .map_err(|err| CliError::new(format!("release tagging failed: {err}")))?;
    write_stdout_line(&format!("tagged build {} as release", identity.build_hash))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Table Commands
// ============================================================================

/// Dispatches table subcommands.
fn command_table(command: TableCommand) -> CliResult<ExitCode> {
    match command {
        TableCommand::Ensure(command) => command_table_ensure(&command),
        TableCommand::Exists(command) => command_table_exists(&command),
        TableCommand::Delete(command) => command_table_delete(&command),
    }
}

/// Executes `table ensure`.
fn command_table_ensure(command: &StoreCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let transmitter = build_transmitter(&config)?;
    transmitter
        .initialize()
        .map_err(|err| CliError::new(format!("table setup failed: {err}")))?;
    write_stdout_line(&format!("table {} is active", transmitter.table()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `table exists`.
fn command_table_exists(command: &StoreCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let transmitter = build_transmitter(&config)?;
    let exists = transmitter
        .client()
        .table_exists(transmitter.table())
        .map_err(|err| CliError::new(format!("table lookup failed: {err}")))?;
    write_stdout_line(if exists { "true" } else { "false" })
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `table delete`.
fn command_table_delete(command: &StoreCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let transmitter = build_transmitter(&config)?;
    let removed = transmitter
        .remove_table()
        .map_err(|err| CliError::new(format!("table delete failed: {err}")))?;
    let message = if removed {
        format!("table {} deleted", transmitter.table())
    } else {
        format!("table {} does not exist", transmitter.table())
    };
    write_stdout_line(&message).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line("config is valid")
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Loads and validates the configuration.
fn load_config(path: Option<&Path>) -> CliResult<PerfTrackerConfig> {
    PerfTrackerConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Resolves the build identity, preferring an explicit hash over the environment.
fn resolve_identity(
    config: &PerfTrackerConfig,
    hash_override: Option<&str>,
) -> CliResult<BuildIdentity> {
    identity_with_override(config, hash_override, |name| std::env::var(name).ok())
}

/// Resolves the build identity against an arbitrary variable lookup.
fn identity_with_override(
    config: &PerfTrackerConfig,
    hash_override: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> CliResult<BuildIdentity> {
    let hash_env = config.build.hash_env.as_str();
    config
        .build
        .identity_from(|name| match hash_override {
            Some(hash) if name == hash_env => Some(hash.to_string()),
            _ => lookup(name),
        })
        .map_err(|err| CliError::new(format!("failed to resolve build identity: {err}")))
}

/// Builds a transmitter bound to the configured `DynamoDB` table.
fn build_transmitter(config: &PerfTrackerConfig) -> CliResult<Transmitter<DynamoDbBackend>> {
    let table = config.store.table().map_err(|err| CliError::new(err.to_string()))?;
    let sink = config
        .logging
        .build_sink()
        .map_err(|err| CliError::new(format!("failed to open event log: {err}")))?;
    let backend = DynamoDbBackend::new(&config.store.dynamodb())
        .map_err(|err| CliError::new(format!("failed to build store client: {err}")))?;
    let client = MetricStoreClient::new(backend, config.store.settings()).with_event_sink(sink);
    let aggregator = Aggregator::new(config.aggregation.settings());
    Ok(Transmitter::new(aggregator, client, table))
}

// ============================================================================
// SECTION: File Input
// ============================================================================

/// Reads a collector document within the document size limit.
fn read_document(path: &Path) -> CliResult<Vec<u8>> {
    read_bytes_with_limit(path, MAX_DOCUMENT_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{} is {size} bytes, exceeding the {limit} byte limit",
            path.display()
        )),
    })
}

/// Errors raised by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    // Metadata can lag a file that is still growing.
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
