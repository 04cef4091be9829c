//! # Ozone CLI Adapters
//!
//! Production catalog and block store, backed by the `ozone debug` tool.
//!
//! | Port | Command |
//! |------|---------|
//! | `ContainerCatalog` | `ozone debug container list` |
//! | `BlockMetadataSource` | `ozone debug ldb --db=<dbFile> scan --cf=block_data` |
//!
//! Every invocation runs with stdin closed, is killed when its timeout
//! expires, and fails on a non-zero exit status.

use crate::domain::entities::{BlockScan, ContainerDescriptor, RawBlockEntry};
use crate::domain::errors::{CatalogError, CommandError, StoreScanError};
use crate::ports::outbound::{BlockMetadataSource, ContainerCatalog};
use async_trait::async_trait;
use serde::de::{Deserializer as _, MapAccess, Visitor};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_OZONE_BINARY: &str = "ozone";

/// Column family holding block metadata.
pub const BLOCK_DATA_COLUMN_FAMILY: &str = "block_data";

/// Default bound on a single `ozone debug` invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variable carrying JVM options for the Ozone tool.
pub const OZONE_OPTS_ENV: &str = "OZONE_OPTS";

// =============================================================================
// COMMAND
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OzoneCommandConfig {
    pub binary: PathBuf,
    /// Exported as `OZONE_OPTS` when set.
    pub opts: Option<String>,
    /// Passed as `-conf=<file>` when set.
    pub conf_file: Option<PathBuf>,
    pub timeout: Duration,
    /// Log each invocation's output size and stderr.
    pub trace_output: bool,
}

impl Default for OzoneCommandConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_OZONE_BINARY),
            opts: None,
            conf_file: None,
            timeout: DEFAULT_COMMAND_TIMEOUT,
            trace_output: false,
        }
    }
}

/// One `ozone debug <subcommand...>` invocation.
#[derive(Debug, Clone)]
pub struct OzoneDebugCommand {
    args: Vec<String>,
}

impl OzoneDebugCommand {
    pub fn new(config: &OzoneCommandConfig, subcommand: &[&str]) -> Self {
        let mut args = vec!["debug".to_string()];
        if let Some(conf) = &config.conf_file {
            args.push(format!("-conf={}", conf.display()));
        }
        args.extend(subcommand.iter().map(|s| s.to_string()));
        Self { args }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn display(&self, config: &OzoneCommandConfig) -> String {
        format!("{} {}", config.binary.display(), self.args.join(" "))
    }

    /// Run to completion and return stdout.
    pub async fn output(&self, config: &OzoneCommandConfig) -> Result<Vec<u8>, CommandError> {
        let command = self.display(config);
        debug!(command = %command, "running ozone debug command");

        let mut cmd = Command::new(&config.binary);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(opts) = &config.opts {
            cmd.env(OZONE_OPTS_ENV, opts);
        }

        let child = cmd.spawn().map_err(|e| CommandError::Spawn {
            command: command.clone(),
            message: e.to_string(),
        })?;

        // Dropping the future on timeout kills the child.
        let output = match tokio::time::timeout(config.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| CommandError::Spawn {
                command: command.clone(),
                message: e.to_string(),
            })?,
            Err(_) => {
                return Err(CommandError::Timeout {
                    command,
                    timeout: config.timeout,
                })
            }
        };

        if config.trace_output {
            debug!(
                command = %command,
                status = %output.status,
                stdout_bytes = output.stdout.len(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "command output"
            );
        }

        if !output.status.success() {
            return Err(CommandError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// `ozone debug container list`
#[derive(Debug, Clone, Default)]
pub struct OzoneContainerCatalog {
    config: OzoneCommandConfig,
}

impl OzoneContainerCatalog {
    pub fn new(config: OzoneCommandConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ContainerCatalog for OzoneContainerCatalog {
    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, CatalogError> {
        let stdout = OzoneDebugCommand::new(&self.config, &["container", "list"])
            .output(&self.config)
            .await?;
        parse_container_list(&stdout)
    }
}

/// Parse a sequence of concatenated JSON objects, one per container.
pub fn parse_container_list(output: &[u8]) -> Result<Vec<ContainerDescriptor>, CatalogError> {
    let stream = serde_json::Deserializer::from_slice(output).into_iter::<Value>();
    let mut containers = Vec::new();

    for (index, document) in stream.enumerate() {
        let document = document.map_err(|e| CatalogError::Parse(e.to_string()))?;
        if !document.is_object() {
            return Err(CatalogError::InvalidEntry {
                index,
                message: "expected a JSON object".to_string(),
            });
        }
        let container: ContainerDescriptor =
            serde_json::from_value(document).map_err(|e| CatalogError::InvalidEntry {
                index,
                message: e.to_string(),
            })?;
        containers.push(container);
    }

    Ok(containers)
}

// =============================================================================
// BLOCK STORE
// =============================================================================

/// `ozone debug ldb --db=<dbFile> scan --cf=block_data`
#[derive(Debug, Clone, Default)]
pub struct OzoneBlockStore {
    config: OzoneCommandConfig,
}

impl OzoneBlockStore {
    pub fn new(config: OzoneCommandConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BlockMetadataSource for OzoneBlockStore {
    async fn scan_block_store(&self, db_file: &str) -> Result<BlockScan, StoreScanError> {
        let db_arg = format!("--db={}", db_file);
        let cf_arg = format!("--cf={}", BLOCK_DATA_COLUMN_FAMILY);
        let stdout = OzoneDebugCommand::new(&self.config, &["ldb", &db_arg, "scan", &cf_arg])
            .output(&self.config)
            .await?;
        parse_block_scan(&stdout)
    }
}

/// Parse a scan dump: one JSON object mapping raw keys to records.
///
/// Entries keep their scan order, duplicates included. Blank output is an
/// empty store.
pub fn parse_block_scan(output: &[u8]) -> Result<BlockScan, StoreScanError> {
    if output.iter().all(u8::is_ascii_whitespace) {
        return Ok(BlockScan::new());
    }

    let mut deserializer = serde_json::Deserializer::from_slice(output);
    let scan = (&mut deserializer)
        .deserialize_map(ScanVisitor)
        .map_err(|e| StoreScanError::Parse(e.to_string()))?;
    deserializer
        .end()
        .map_err(|e| StoreScanError::Parse(e.to_string()))?;
    Ok(scan)
}

struct ScanVisitor;

impl<'de> Visitor<'de> for ScanVisitor {
    type Value = BlockScan;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of block keys to block records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<BlockScan, A::Error> {
        let mut scan = BlockScan::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, record)) = map.next_entry::<String, Value>()? {
            scan.push(RawBlockEntry::new(key, record));
        }
        Ok(scan)
    }
}
