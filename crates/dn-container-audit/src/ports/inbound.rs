//! # Inbound Ports (Driving Ports)

use crate::domain::errors::CatalogError;
use crate::domain::report::Report;
use async_trait::async_trait;
use tokio::sync::watch;

/// Single-pass, read-only audit of every container on the node.
#[async_trait]
pub trait ContainerAuditApi: Send + Sync {
    /// Reconcile every catalog container.
    ///
    /// Only a catalog failure is an `Err`; per-container failures are entries
    /// of the returned report. Setting `shutdown` to `true` stops scheduling
    /// new containers; the ones not scheduled are reported as cancelled.
    async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<Report, CatalogError>;
}
