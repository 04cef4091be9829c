//! # Reconciler
//!
//! Cross-references one container's block metadata with the block files found
//! under its directory.
//!
//! ## Algorithm
//!
//! 1. Seed the orphan candidates with every enumerated block file
//! 2. For each record, derive `blockFile = chunksPath/localID.block`
//! 3. `blockFileExists` is membership of that path in the enumeration
//! 4. A present path is claimed: removed from the orphan candidates
//! 5. Whatever is left unclaimed is `orphanedBlocks`
//!
//! ## Invariants
//!
//! - Claimed and orphaned paths are disjoint, and together they cover the
//!   enumeration
//! - `blockFileExists` is decided against the enumeration, so a duplicate
//!   local id cannot flip an earlier answer
//! - Paths are compared byte for byte: `chunks//42.block` is not
//!   `chunks/42.block`. No canonicalization, no fuzzy match

use crate::domain::entities::{BlockRecord, ContainerDescriptor, DecodedBlock, LocalId};
use crate::domain::warnings::ConsistencyWarning;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extension of block files, without the dot.
pub const BLOCK_FILE_EXTENSION: &str = "block";

/// Per-container reconciliation result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub blocks: BTreeMap<LocalId, BlockRecord>,
    pub orphaned_blocks: BTreeSet<PathBuf>,
    pub warnings: Vec<ConsistencyWarning>,
}

/// `chunksPath/localID.block`
pub fn block_file_path(chunks_path: &str, local_id: &str) -> String {
    format!("{}/{}.{}", chunks_path, local_id, BLOCK_FILE_EXTENSION)
}

/// Reconcile `records` (already partitioned to `container`) against the
/// container's enumerated block files.
pub fn reconcile_container(
    container: &ContainerDescriptor,
    on_disk: &BTreeSet<PathBuf>,
    records: &[DecodedBlock],
    escalate_dangling: bool,
) -> Reconciliation {
    // `Path` equality ignores repeated and trailing separators; match on the
    // raw path instead.
    let enumerated: HashMap<&OsStr, &Path> = on_disk
        .iter()
        .map(|path| (path.as_os_str(), path.as_path()))
        .collect();
    let mut orphaned_blocks = on_disk.clone();
    let mut blocks = BTreeMap::new();
    let mut warnings = Vec::new();

    for record in records {
        let local_id = &record.key.local_id;
        let block_file = block_file_path(&container.chunks_path, local_id);
        let claimed = enumerated.get(OsStr::new(&block_file));

        let block_file_exists = claimed.is_some();
        if let Some(path) = claimed {
            orphaned_blocks.remove(*path);
        } else if escalate_dangling {
            warnings.push(ConsistencyWarning::DanglingMetadata {
                container_id: container.container_id.clone(),
                local_id: local_id.clone(),
                block_file: block_file.clone(),
            });
        }

        let annotated = BlockRecord {
            metadata: record.metadata.clone(),
            block_file,
            block_file_exists,
        };
        if blocks.insert(local_id.clone(), annotated).is_some() {
            warnings.push(ConsistencyWarning::DuplicateLocalId {
                container_id: container.container_id.clone(),
                local_id: local_id.clone(),
            });
        }
    }

    Reconciliation {
        blocks,
        orphaned_blocks,
        warnings,
    }
}

#[cfg(test)]
mod tests;
