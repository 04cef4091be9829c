//! # Datanode Inspector
//!
//! Command surface over `dn-container-audit`: parses arguments, wires the
//! Ozone CLI adapters into the audit service, forwards Ctrl+C as a
//! cooperative shutdown, writes the report, and maps the outcome to an exit
//! status.
//!
//! ## Exit Status
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Every container reconciled |
//! | 1 | Report written, but some containers failed or were cancelled |
//! | 2 | No report: catalog unavailable, bad configuration, or write failure |

pub mod args;
pub mod logging;
pub mod output;

use anyhow::{Context, Result};
use dn_container_audit::{
    AuditDependencies, AuditSummary, ConfigError, ContainerAuditApi, ContainerAuditService,
    LocalBlockFileEnumerator, OzoneBlockStore, OzoneContainerCatalog, Report,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

pub use args::Args;
pub use output::{Destination, DEFAULT_REPORT_FILE};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_PARTIAL: u8 = 1;
pub const EXIT_FATAL: u8 = 2;

/// Outcome of a run that produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Complete,
    Partial { failed: usize },
}

impl RunStatus {
    pub fn from_summary(summary: &AuditSummary) -> Self {
        if summary.is_successful() {
            RunStatus::Complete
        } else {
            RunStatus::Partial {
                failed: summary.failed,
            }
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            RunStatus::Complete => ExitCode::from(EXIT_SUCCESS),
            RunStatus::Partial { .. } => ExitCode::from(EXIT_PARTIAL),
        }
    }
}

/// Audit the node described by `args` through the Ozone CLI.
pub async fn run(args: Args) -> Result<RunStatus> {
    let config = args.audit_config();
    config.validate().context("invalid configuration")?;
    let ozone = args.ozone_config();
    if ozone.timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout("command")).context("invalid configuration");
    }

    let service = ContainerAuditService::new(
        AuditDependencies {
            catalog: Arc::new(OzoneContainerCatalog::new(ozone.clone())),
            block_source: Arc::new(OzoneBlockStore::new(ozone)),
            block_files: Arc::new(LocalBlockFileEnumerator::new()),
        },
        config,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; no further containers will be scheduled");
            let _ = shutdown_tx.send(true);
        }
    });

    let outcome = audit_and_publish(&service, &args, shutdown_rx).await;
    signal_task.abort();
    outcome
}

/// Run `api`, then write the report where `args` says.
pub async fn audit_and_publish<A: ContainerAuditApi + ?Sized>(
    api: &A,
    args: &Args,
    shutdown: watch::Receiver<bool>,
) -> Result<RunStatus> {
    let report = api
        .run(shutdown)
        .await
        .context("audit aborted before any container was processed")?;

    publish(&report, args)?;

    let summary = AuditSummary::from_report(&report);
    for (container_id, failure) in report.failures() {
        warn!(
            container_id = %container_id,
            kind = failure.kind(),
            error = %failure,
            "container not reconciled"
        );
    }
    let status = RunStatus::from_summary(&summary);
    info!(
        containers = summary.containers,
        failed = summary.failed,
        status = ?status,
        "inspection complete"
    );
    Ok(status)
}

fn publish(report: &Report, args: &Args) -> Result<()> {
    output::emit_report(report, &args.destination())?;
    if let Some(dir) = &args.split_dir {
        output::write_split_reports(report, dir)?;
    }
    Ok(())
}
