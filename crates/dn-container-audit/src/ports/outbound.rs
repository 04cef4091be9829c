//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the reconciler depends on. The reconciler never sees how
//! they are implemented.
//!
//! Production: `OzoneContainerCatalog`, `OzoneBlockStore`, `LocalBlockFileEnumerator`
//! Testing: `InMemoryCatalog`, `InMemoryBlockStore`, `InMemoryBlockFiles`

use crate::domain::entities::{BlockScan, ContainerDescriptor};
use crate::domain::errors::{CatalogError, EnumerationError, StoreScanError};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Source of the container list (ListContainers).
#[async_trait]
pub trait ContainerCatalog: Send + Sync {
    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, CatalogError>;
}

/// Source of block metadata (ScanBlockStore).
#[async_trait]
pub trait BlockMetadataSource: Send + Sync {
    /// Every `block_data` entry of the store at `db_file`, in scan order.
    ///
    /// The scan may include records of several containers.
    async fn scan_block_store(&self, db_file: &str) -> Result<BlockScan, StoreScanError>;
}

/// Block file enumeration (EnumerateBlockFiles).
#[async_trait]
pub trait BlockFileEnumerator: Send + Sync {
    /// Every `*.block` file under `container_path`, at any depth.
    async fn enumerate_block_files(
        &self,
        container_path: &Path,
    ) -> Result<BTreeSet<PathBuf>, EnumerationError>;
}
