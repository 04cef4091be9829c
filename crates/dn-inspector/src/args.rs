//! Command-line arguments.

use crate::output::{Destination, DEFAULT_REPORT_FILE};
use clap::Parser;
use dn_container_audit::adapters::ozone::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_OZONE_BINARY};
use dn_container_audit::domain::config::{default_workers, DEFAULT_CONTAINER_TIMEOUT};
use dn_container_audit::{AuditConfig, OzoneCommandConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Datanode Inspector: cross-checks every container's block metadata against
/// the block files on disk.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "dn-inspector", version)]
#[command(about = "Report block metadata / block file consistency for every container")]
pub struct Args {
    /// Write the report to standard output instead of the report file
    #[arg(long)]
    pub stdout: bool,

    /// Report file written when --stdout is not given
    #[arg(long, env = "DN_INSPECTOR_REPORT_FILE", default_value = DEFAULT_REPORT_FILE)]
    pub report_file: PathBuf,

    /// Also write one container_<id>.json per container into this directory
    #[arg(long, env = "DN_INSPECTOR_SPLIT_DIR")]
    pub split_dir: Option<PathBuf>,

    /// Path of the ozone executable
    #[arg(long, env = "DN_INSPECTOR_OZONE_BIN", default_value = DEFAULT_OZONE_BINARY)]
    pub ozone_bin: PathBuf,

    /// JVM options exported to ozone as OZONE_OPTS
    #[arg(long, env = "DN_INSPECTOR_OZONE_OPTS")]
    pub ozone_opts: Option<String>,

    /// Ozone configuration file, passed as -conf=<file>
    #[arg(long, env = "DN_INSPECTOR_OZONE_CONF")]
    pub ozone_conf: Option<PathBuf>,

    /// Containers audited concurrently [default: 2 x available cores]
    #[arg(long, env = "DN_INSPECTOR_WORKERS")]
    pub workers: Option<usize>,

    /// Time limit for one container's enumeration and store fetch
    #[arg(
        long,
        env = "DN_INSPECTOR_CONTAINER_TIMEOUT_SECS",
        default_value_t = DEFAULT_CONTAINER_TIMEOUT.as_secs()
    )]
    pub container_timeout_secs: u64,

    /// Time limit for a single ozone invocation
    #[arg(
        long,
        env = "DN_INSPECTOR_COMMAND_TIMEOUT_SECS",
        default_value_t = DEFAULT_COMMAND_TIMEOUT.as_secs()
    )]
    pub command_timeout_secs: u64,

    /// Log a warning for every block whose file is missing
    #[arg(long)]
    pub escalate_dangling: bool,

    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "DN_INSPECTOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Log every ozone invocation's output size and stderr
    #[arg(long)]
    pub trace_commands: bool,
}

impl Args {
    pub fn destination(&self) -> Destination {
        if self.stdout {
            Destination::Stdout
        } else {
            Destination::File(self.report_file.clone())
        }
    }

    pub fn audit_config(&self) -> AuditConfig {
        AuditConfig {
            workers: self.workers.unwrap_or_else(default_workers),
            container_timeout: Duration::from_secs(self.container_timeout_secs),
            escalate_dangling: self.escalate_dangling,
        }
    }

    pub fn ozone_config(&self) -> OzoneCommandConfig {
        OzoneCommandConfig {
            binary: self.ozone_bin.clone(),
            opts: self.ozone_opts.clone(),
            conf_file: self.ozone_conf.clone(),
            timeout: Duration::from_secs(self.command_timeout_secs),
            trace_output: self.trace_commands,
        }
    }
}
