//! # Metadata Consistency Warnings
//!
//! Non-fatal anomalies found while reconciling. They are logged when raised,
//! collected on the `Report`, and never abort the run.

use crate::domain::entities::{ContainerId, LocalId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyWarning {
    /// A scanned record names a container absent from the catalog.
    UnknownContainer {
        db_file: String,
        container_id: ContainerId,
        local_id: LocalId,
    },

    /// A scanned record names a catalog container that uses another store.
    ForeignContainer {
        db_file: String,
        container_id: ContainerId,
        local_id: LocalId,
        expected_db_file: String,
    },

    /// Two records resolve to the same local id; the later one was kept.
    DuplicateLocalId {
        container_id: ContainerId,
        local_id: LocalId,
    },

    /// A scanned entry's composite key could not be resolved.
    UndecodableKey {
        db_file: String,
        key: String,
        reason: String,
    },

    /// Metadata references a block file missing from disk.
    ///
    /// Only raised when dangling metadata escalation is enabled.
    DanglingMetadata {
        container_id: ContainerId,
        local_id: LocalId,
        block_file: String,
    },
}

impl ConsistencyWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            ConsistencyWarning::UnknownContainer { .. } => "UnknownContainer",
            ConsistencyWarning::ForeignContainer { .. } => "ForeignContainer",
            ConsistencyWarning::DuplicateLocalId { .. } => "DuplicateLocalId",
            ConsistencyWarning::UndecodableKey { .. } => "UndecodableKey",
            ConsistencyWarning::DanglingMetadata { .. } => "DanglingMetadata",
        }
    }

    /// Emit this warning on the `warn` level.
    pub fn log(&self) {
        tracing::warn!(kind = self.kind(), "{}", self);
    }
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyWarning::UnknownContainer {
                db_file,
                container_id,
                local_id,
            } => write!(
                f,
                "block {}|{} in {} belongs to no catalog container; dropped",
                container_id, local_id, db_file
            ),
            ConsistencyWarning::ForeignContainer {
                db_file,
                container_id,
                local_id,
                expected_db_file,
            } => write!(
                f,
                "block {}|{} found in {} but container {} uses {}; dropped",
                container_id, local_id, db_file, container_id, expected_db_file
            ),
            ConsistencyWarning::DuplicateLocalId {
                container_id,
                local_id,
            } => write!(
                f,
                "container {} has more than one record for local id {}; last one kept",
                container_id, local_id
            ),
            ConsistencyWarning::UndecodableKey {
                db_file,
                key,
                reason,
            } => write!(f, "skipped entry `{}` in {}: {}", key, db_file, reason),
            ConsistencyWarning::DanglingMetadata {
                container_id,
                local_id,
                block_file,
            } => write!(
                f,
                "container {} block {} has metadata but {} is missing",
                container_id, local_id, block_file
            ),
        }
    }
}
