//! # Domain Errors
//!
//! Error types for the container audit.
//!
//! ## Propagation
//!
//! | Error | Scope | Effect |
//! |-------|-------|--------|
//! | `CatalogError` | run | Fatal: nothing to reconcile |
//! | `StoreScanError` | container | Container reported with an error marker |
//! | `EnumerationError` | container | Container reported with an error marker |
//! | `ContainerFailure` | container | The marker itself |
//!
//! Non-fatal anomalies are not errors; see `domain::warnings`.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Failure of an external inspection command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The process could not be started.
    #[error("failed to launch `{command}`: {message}")]
    Spawn { command: String, message: String },

    /// The process ran but exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The process did not finish within its timeout and was killed.
    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
}

/// The container catalog could not be obtained (CatalogUnavailable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalog command failed.
    #[error("container catalog unavailable: {0}")]
    Command(#[from] CommandError),

    /// The catalog output is not a stream of JSON documents.
    #[error("container catalog output is not valid JSON: {0}")]
    Parse(String),

    /// A catalog entry lacks a required field or has the wrong shape.
    #[error("container catalog entry #{index} is invalid: {message}")]
    InvalidEntry { index: usize, message: String },

    /// Two catalog entries share a container id.
    #[error("container {0} appears more than once in the catalog")]
    DuplicateContainer(String),

    /// The catalog source reported itself unavailable.
    #[error("container catalog unavailable: {0}")]
    Unavailable(String),
}

/// A block store could not be scanned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreScanError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("block store scan output is not a JSON object: {0}")]
    Parse(String),

    #[error("block store unavailable: {0}")]
    Unavailable(String),
}

/// A container directory could not be enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read {}: {message}", .path.display())]
pub struct EnumerationError {
    pub path: PathBuf,
    pub message: String,
}

impl EnumerationError {
    pub fn new(path: &Path, message: impl ToString) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

/// Why a single container has no reconciliation result.
///
/// Recorded on the container's report entry; never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerFailure {
    /// The container's block store could not be scanned.
    #[error("block store {db_file} could not be scanned: {source}")]
    StoreScan {
        db_file: String,
        #[source]
        source: StoreScanError,
    },

    /// The container's directory could not be enumerated.
    #[error("block files could not be enumerated: {0}")]
    FilesystemEnumeration(#[from] EnumerationError),

    /// Enumeration and store fetch together exceeded the container timeout.
    #[error("container audit exceeded {}s", .0.as_secs())]
    Timeout(Duration),

    /// The run was cancelled before this container was scheduled.
    #[error("run cancelled before the container was audited")]
    Cancelled,

    /// The worker auditing this container terminated abnormally.
    #[error("audit worker aborted: {0}")]
    WorkerAborted(String),
}

impl ContainerFailure {
    /// Stable name used in the report's error marker.
    pub fn kind(&self) -> &'static str {
        match self {
            ContainerFailure::StoreScan { .. } => "StoreScanFailure",
            ContainerFailure::FilesystemEnumeration(_) => "FilesystemEnumerationFailure",
            ContainerFailure::Timeout(_) => "Timeout",
            ContainerFailure::Cancelled => "Cancelled",
            ContainerFailure::WorkerAborted(_) => "WorkerAborted",
        }
    }
}

/// Invalid audit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),
}
