//! # Scan Partitioning
//!
//! One store scan may hold records for several containers sharing that store.
//! Records are routed by their embedded container id, never by the store they
//! came from.
//!
//! | Record's container | Outcome |
//! |--------------------|---------|
//! | in catalog, same `dbFile` | kept for that container |
//! | in catalog, other `dbFile` | dropped, `ForeignContainer` |
//! | not in catalog | dropped, `UnknownContainer` |
//! | key unresolvable | dropped, `UndecodableKey` |

use crate::domain::block_key::BlockKey;
use crate::domain::entities::{BlockScan, ContainerDescriptor, ContainerId, DecodedBlock};
use crate::domain::errors::CatalogError;
use crate::domain::warnings::ConsistencyWarning;
use std::collections::HashMap;

/// Container id -> store location, built once per run from the catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    db_files: HashMap<ContainerId, String>,
}

impl CatalogIndex {
    /// Fails if a container id occurs twice.
    pub fn new(containers: &[ContainerDescriptor]) -> Result<Self, CatalogError> {
        let mut db_files = HashMap::with_capacity(containers.len());
        for container in containers {
            let previous =
                db_files.insert(container.container_id.clone(), container.db_file.clone());
            if previous.is_some() {
                return Err(CatalogError::DuplicateContainer(
                    container.container_id.clone(),
                ));
            }
        }
        Ok(Self { db_files })
    }

    pub fn db_file_of(&self, container_id: &str) -> Option<&str> {
        self.db_files.get(container_id).map(String::as_str)
    }
}

/// A store scan split per container, in scan order.
#[derive(Debug, Clone, Default)]
pub struct PartitionedScan {
    by_container: HashMap<ContainerId, Vec<DecodedBlock>>,
    warnings: Vec<ConsistencyWarning>,
}

impl PartitionedScan {
    /// Records for one container; empty if the store holds none.
    pub fn records_for(&self, container_id: &str) -> &[DecodedBlock] {
        self.by_container
            .get(container_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn warnings(&self) -> &[ConsistencyWarning] {
        &self.warnings
    }

    pub fn record_count(&self) -> usize {
        self.by_container.values().map(Vec::len).sum()
    }
}

/// Route every entry of the scan of `db_file` to its container.
pub fn partition_scan(db_file: &str, scan: BlockScan, index: &CatalogIndex) -> PartitionedScan {
    let mut partitioned = PartitionedScan::default();

    for entry in scan {
        let key = match BlockKey::decode(&entry.key, &entry.record) {
            Ok(key) => key,
            Err(err) => {
                partitioned.warnings.push(ConsistencyWarning::UndecodableKey {
                    db_file: db_file.to_string(),
                    key: entry.key,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        match index.db_file_of(&key.container_id) {
            None => partitioned.warnings.push(ConsistencyWarning::UnknownContainer {
                db_file: db_file.to_string(),
                container_id: key.container_id,
                local_id: key.local_id,
            }),
            Some(expected) if expected != db_file => {
                partitioned.warnings.push(ConsistencyWarning::ForeignContainer {
                    db_file: db_file.to_string(),
                    expected_db_file: expected.to_string(),
                    container_id: key.container_id,
                    local_id: key.local_id,
                })
            }
            Some(_) => partitioned
                .by_container
                .entry(key.container_id.clone())
                .or_default()
                .push(DecodedBlock::new(key, entry.record)),
        }
    }

    partitioned
}
