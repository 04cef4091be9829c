//! # In-Memory Adapters
//!
//! Fakes of the driven ports for tests and dry runs. Production uses the
//! Ozone CLI adapters and `LocalBlockFileEnumerator`.

use crate::domain::entities::{BlockScan, ContainerDescriptor, RawBlockEntry};
use crate::domain::errors::{CatalogError, EnumerationError, StoreScanError};
use crate::ports::outbound::{BlockFileEnumerator, BlockMetadataSource, ContainerCatalog};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fixed container list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    containers: Vec<ContainerDescriptor>,
    unavailable: Option<String>,
}

impl InMemoryCatalog {
    pub fn new(containers: Vec<ContainerDescriptor>) -> Self {
        Self {
            containers,
            unavailable: None,
        }
    }

    /// Catalog that always fails.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            containers: Vec::new(),
            unavailable: Some(reason.into()),
        }
    }
}

#[async_trait]
impl ContainerCatalog for InMemoryCatalog {
    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, CatalogError> {
        match &self.unavailable {
            Some(reason) => Err(CatalogError::Unavailable(reason.clone())),
            None => Ok(self.containers.clone()),
        }
    }
}

/// Block stores keyed by `dbFile`. Counts scans per store.
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
    stores: HashMap<String, BlockScan>,
    failing: HashMap<String, StoreScanError>,
    delay: Option<Duration>,
    scans: Mutex<HashMap<String, usize>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the store at `db_file`.
    pub fn with_entry(mut self, db_file: &str, key: impl Into<String>, record: Value) -> Self {
        self.stores
            .entry(db_file.to_string())
            .or_default()
            .push(RawBlockEntry::new(key, record));
        self
    }

    /// Register an empty store.
    pub fn with_empty_store(mut self, db_file: &str) -> Self {
        self.stores.entry(db_file.to_string()).or_default();
        self
    }

    pub fn with_failure(mut self, db_file: &str, error: StoreScanError) -> Self {
        self.failing.insert(db_file.to_string(), error);
        self
    }

    /// Delay every scan.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of scans performed against `db_file`.
    pub fn scan_count(&self, db_file: &str) -> usize {
        self.scans.lock().get(db_file).copied().unwrap_or(0)
    }
}

#[async_trait]
impl BlockMetadataSource for InMemoryBlockStore {
    async fn scan_block_store(&self, db_file: &str) -> Result<BlockScan, StoreScanError> {
        *self.scans.lock().entry(db_file.to_string()).or_default() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failing.get(db_file) {
            return Err(error.clone());
        }
        self.stores
            .get(db_file)
            .cloned()
            .ok_or_else(|| StoreScanError::Unavailable(format!("no block store at {}", db_file)))
    }
}

/// Block file trees keyed by container path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlockFiles {
    trees: HashMap<PathBuf, BTreeSet<PathBuf>>,
    delay: Option<Duration>,
}

impl InMemoryBlockFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `container_path` with the given block files.
    pub fn with_tree<I, P>(mut self, container_path: impl Into<PathBuf>, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.trees.insert(
            container_path.into(),
            files.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Delay every enumeration.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl BlockFileEnumerator for InMemoryBlockFiles {
    async fn enumerate_block_files(
        &self,
        container_path: &Path,
    ) -> Result<BTreeSet<PathBuf>, EnumerationError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.trees
            .get(container_path)
            .cloned()
            .ok_or_else(|| EnumerationError::new(container_path, "No such file or directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_block_store_counts_scans() {
        let store = InMemoryBlockStore::new().with_entry("/db/1", "1|1", json!({}));

        assert_eq!(store.scan_block_store("/db/1").await.unwrap().len(), 1);
        assert_eq!(store.scan_block_store("/db/1").await.unwrap().len(), 1);
        assert_eq!(store.scan_count("/db/1"), 2);
        assert!(store.scan_block_store("/db/missing").await.is_err());
    }

    #[tokio::test]
    async fn test_unregistered_tree_is_unreadable() {
        let files = InMemoryBlockFiles::new().with_tree("/data/1", ["/data/1/chunks/1.block"]);

        assert_eq!(
            files
                .enumerate_block_files(Path::new("/data/1"))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(files
            .enumerate_block_files(Path::new("/data/2"))
            .await
            .is_err());
    }
}
