//! # Datanode Container Audit
//!
//! Read-only consistency check of a storage node's containers. For every
//! container in the node's catalog, block metadata from the container's
//! key-value store is cross-referenced with the `*.block` files under the
//! container's directory.
//!
//! ## Architecture
//!
//! ```text
//! ContainerCatalog ──→ [CatalogIndex] ──→ bounded worker pool
//!                                              │
//!           BlockMetadataSource ──[ScanCache]──┤
//!           BlockFileEnumerator ───────────────┤
//!                                              ↓
//!                                      reconcile_container
//!                                              ↓
//!                                      ReportAssembler ──→ Report
//! ```
//!
//! ## Guarantees
//!
//! | Guarantee | Description |
//! |-----------|-------------|
//! | Read-only | Nothing on the node is modified |
//! | Complete | Every catalog container has a report entry, failed or not |
//! | Disjoint | No path is both claimed by a block and reported orphaned |
//! | Deterministic | Same node state, same report |
//! | Fetch-once | Each `dbFile` is scanned at most once per run |
//! | Isolated | A failing container never aborts the run |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Pure reconciliation logic
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `adapters/` - Ozone CLI, local filesystem, scan cache, in-memory fakes
//! - `service/` - Worker pool orchestrating a run
//!
//! ## Usage
//!
//! ```ignore
//! use dn_container_audit::*;
//!
//! let service = ContainerAuditService::new(
//!     AuditDependencies {
//!         catalog: Arc::new(OzoneContainerCatalog::new(ozone.clone())),
//!         block_source: Arc::new(OzoneBlockStore::new(ozone)),
//!         block_files: Arc::new(LocalBlockFileEnumerator::new()),
//!     },
//!     AuditConfig::default(),
//! );
//! let report = service.run(shutdown_rx).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{
    InMemoryBlockFiles, InMemoryBlockStore, InMemoryCatalog, LocalBlockFileEnumerator, ScanCache,
};
#[cfg(feature = "ozone-cli")]
pub use adapters::{OzoneBlockStore, OzoneCommandConfig, OzoneContainerCatalog};
pub use domain::block_key::BlockKey;
pub use domain::config::AuditConfig;
pub use domain::entities::{
    BlockRecord, BlockScan, ContainerDescriptor, ContainerId, ContainerReport, LocalId,
    RawBlockEntry,
};
pub use domain::errors::{
    CatalogError, CommandError, ConfigError, ContainerFailure, EnumerationError, StoreScanError,
};
pub use domain::reconcile::reconcile_container;
pub use domain::report::{AuditSummary, Report, ReportAssembler};
pub use domain::warnings::ConsistencyWarning;
pub use ports::inbound::ContainerAuditApi;
pub use ports::outbound::{BlockFileEnumerator, BlockMetadataSource, ContainerCatalog};
pub use service::{AuditDependencies, ContainerAuditService};
