//! # Container Audit Service
//!
//! Orchestrates one audit run:
//!
//! ```text
//! ContainerCatalog ──list──→ [CatalogIndex]
//!                                 │
//!            ┌────────────────────┼────────────────────┐
//!            ↓                    ↓                    ↓
//!       worker (c1)          worker (c2)          worker (cN)     ≤ `workers` at once
//!   enumerate + fetch     enumerate + fetch     enumerate + fetch
//!            │                    │                    │
//!            │             [ScanCache: one scan per dbFile]
//!            ↓                    ↓                    ↓
//!                       ReportAssembler ──→ Report
//! ```
//!
//! A container that fails, times out, or is never scheduled still gets a
//! report entry. Only a catalog failure ends the run without a report.

use crate::adapters::scan_cache::ScanCache;
use crate::domain::config::AuditConfig;
use crate::domain::entities::{ContainerDescriptor, ContainerReport};
use crate::domain::errors::{CatalogError, ContainerFailure};
use crate::domain::partition::CatalogIndex;
use crate::domain::reconcile::{reconcile_container, Reconciliation};
use crate::domain::report::{AuditSummary, Report, ReportAssembler};
use crate::domain::warnings::ConsistencyWarning;
use crate::ports::inbound::ContainerAuditApi;
use crate::ports::outbound::{BlockFileEnumerator, BlockMetadataSource, ContainerCatalog};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Failure recorded for a container whose worker panicked or was cancelled.
/// Join errors carry no container, so every such container gets this reason;
/// the individual errors are logged as they are collected.
const WORKER_ABORTED: &str = "worker panicked or was cancelled before reporting";

/// Driven-port implementations for the service.
pub struct AuditDependencies<C, B, F> {
    pub catalog: Arc<C>,
    pub block_source: Arc<B>,
    pub block_files: Arc<F>,
}

/// Implements `ContainerAuditApi` over the injected ports.
pub struct ContainerAuditService<C, B, F>
where
    C: ContainerCatalog,
    B: BlockMetadataSource,
    F: BlockFileEnumerator,
{
    catalog: Arc<C>,
    block_source: Arc<B>,
    block_files: Arc<F>,
    config: AuditConfig,
}

impl<C, B, F> ContainerAuditService<C, B, F>
where
    C: ContainerCatalog + 'static,
    B: BlockMetadataSource + 'static,
    F: BlockFileEnumerator + 'static,
{
    pub fn new(deps: AuditDependencies<C, B, F>, config: AuditConfig) -> Self {
        Self {
            catalog: deps.catalog,
            block_source: deps.block_source,
            block_files: deps.block_files,
            config,
        }
    }

    async fn audit(&self, mut shutdown: watch::Receiver<bool>) -> Result<Report, CatalogError> {
        let started = Instant::now();

        let catalog = self.catalog.list_containers().await.map_err(|err| {
            error!(error = %err, "container catalog unavailable");
            err
        })?;
        let index = Arc::new(CatalogIndex::new(&catalog).map_err(|err| {
            error!(error = %err, "container catalog rejected");
            err
        })?);
        info!(
            containers = catalog.len(),
            workers = self.config.workers,
            "starting container audit"
        );

        let cache = Arc::new(ScanCache::new(Arc::clone(&self.block_source), index));
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();
        let mut scheduled = 0;

        for container in &catalog {
            let permit = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let worker = Worker {
                cache: Arc::clone(&cache),
                block_files: Arc::clone(&self.block_files),
                timeout: self.config.container_timeout,
                escalate_dangling: self.config.escalate_dangling,
            };
            let container = container.clone();
            tasks.spawn(async move {
                let outcome = worker.audit_container(container).await;
                drop(permit);
                outcome
            });
            scheduled += 1;
        }

        let mut assembler = ReportAssembler::new();
        if scheduled < catalog.len() {
            warn!(
                scheduled,
                skipped = catalog.len() - scheduled,
                "shutdown requested; remaining containers not audited"
            );
            for container in &catalog[scheduled..] {
                assembler.insert(ContainerReport::failed(
                    container.clone(),
                    ContainerFailure::Cancelled,
                ));
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((report, warnings)) => {
                    assembler.add_warnings(warnings);
                    assembler.insert(report);
                }
                Err(err) => error!(error = %err, "audit worker terminated abnormally"),
            }
        }

        assembler.add_warnings(cache.warnings());
        let report = assembler.finish(
            &catalog,
            ContainerFailure::WorkerAborted(WORKER_ABORTED.to_string()),
        );

        let summary = AuditSummary::from_report(&report);
        info!(
            containers = summary.containers,
            reconciled = summary.reconciled,
            failed = summary.failed,
            blocks = summary.blocks,
            dangling_blocks = summary.dangling_blocks,
            orphaned_blocks = summary.orphaned_blocks,
            warnings = summary.warnings,
            store_scans = cache.scans_performed(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "container audit finished"
        );

        Ok(report)
    }
}

#[async_trait]
impl<C, B, F> ContainerAuditApi for ContainerAuditService<C, B, F>
where
    C: ContainerCatalog + 'static,
    B: BlockMetadataSource + 'static,
    F: BlockFileEnumerator + 'static,
{
    async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<Report, CatalogError> {
        self.audit(shutdown).await
    }
}

/// Resolves once shutdown is requested. Never resolves if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// WORKER
// =============================================================================

/// Everything one container's audit needs; owned by its task.
struct Worker<B: BlockMetadataSource, F> {
    cache: Arc<ScanCache<B>>,
    block_files: Arc<F>,
    timeout: Duration,
    escalate_dangling: bool,
}

impl<B, F> Worker<B, F>
where
    B: BlockMetadataSource + 'static,
    F: BlockFileEnumerator,
{
    async fn audit_container(
        &self,
        container: ContainerDescriptor,
    ) -> (ContainerReport, Vec<ConsistencyWarning>) {
        let started = Instant::now();
        let container_id = container.container_id.clone();

        match tokio::time::timeout(self.timeout, self.reconcile(&container)).await {
            Ok(Ok(reconciliation)) => {
                for warning in &reconciliation.warnings {
                    warning.log();
                }
                debug!(
                    container_id = %container_id,
                    blocks = reconciliation.blocks.len(),
                    orphaned_blocks = reconciliation.orphaned_blocks.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "container reconciled"
                );
                let Reconciliation {
                    blocks,
                    orphaned_blocks,
                    warnings,
                } = reconciliation;
                (
                    ContainerReport::reconciled(container, blocks, orphaned_blocks),
                    warnings,
                )
            }
            Ok(Err(failure)) => {
                warn!(
                    container_id = %container_id,
                    kind = failure.kind(),
                    error = %failure,
                    "container audit failed"
                );
                (ContainerReport::failed(container, failure), Vec::new())
            }
            Err(_) => {
                warn!(
                    container_id = %container_id,
                    timeout_secs = self.timeout.as_secs(),
                    "container audit timed out"
                );
                (
                    ContainerReport::failed(container, ContainerFailure::Timeout(self.timeout)),
                    Vec::new(),
                )
            }
        }
    }

    /// Enumeration and store fetch run concurrently. A store failure takes
    /// precedence when both fail.
    async fn reconcile(
        &self,
        container: &ContainerDescriptor,
    ) -> Result<Reconciliation, ContainerFailure> {
        let (on_disk, scan) = tokio::join!(
            self.block_files
                .enumerate_block_files(Path::new(&container.container_path)),
            self.cache.fetch(&container.db_file),
        );

        let scan = scan.map_err(|source| ContainerFailure::StoreScan {
            db_file: container.db_file.clone(),
            source,
        })?;
        let on_disk = on_disk?;

        Ok(reconcile_container(
            container,
            &on_disk,
            scan.records_for(&container.container_id),
            self.escalate_dangling,
        ))
    }
}
