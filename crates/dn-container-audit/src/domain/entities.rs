//! # Domain Entities
//!
//! - `ContainerDescriptor` - one catalog entry, read once per run
//! - `RawBlockEntry` - one `block_data` entry as returned by a store scan
//! - `DecodedBlock` - a raw entry with its composite key resolved
//! - `BlockRecord` - block metadata annotated with disk presence
//! - `ContainerReport` - the enriched container emitted into the report

use crate::domain::block_key::{deserialize_opaque_id, BlockKey};
use crate::domain::errors::ContainerFailure;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Container identifier. Integers in the store, opaque strings here.
pub type ContainerId = String;

/// Block identifier local to its container.
pub type LocalId = String;

/// Field names computed by reconciliation; stripped from raw metadata.
const COMPUTED_BLOCK_FIELDS: [&str; 2] = ["blockFile", "blockFileExists"];

/// Field names owned by the report; never copied from pass-through fields.
const RESERVED_REPORT_FIELDS: [&str; 3] = ["blocks", "orphanedBlocks", "error"];

// =============================================================================
// CONTAINER
// =============================================================================

/// A container as declared by the catalog.
///
/// Fields this tool does not interpret are kept in `extra` and written back
/// verbatim into the container's report entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContainerDescriptor {
    #[serde(rename = "containerID", deserialize_with = "deserialize_opaque_id")]
    pub container_id: ContainerId,
    /// Root directory of the container's on-disk data.
    #[serde(rename = "containerPath")]
    pub container_path: String,
    /// Directory holding the container's block files.
    #[serde(rename = "chunksPath")]
    pub chunks_path: String,
    /// Location of the container's key-value store.
    #[serde(rename = "dbFile")]
    pub db_file: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContainerDescriptor {
    pub fn new(
        container_id: impl Into<ContainerId>,
        container_path: impl Into<String>,
        chunks_path: impl Into<String>,
        db_file: impl Into<String>,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            container_path: container_path.into(),
            chunks_path: chunks_path.into(),
            db_file: db_file.into(),
            extra: Map::new(),
        }
    }

    /// Attach a pass-through field.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

// =============================================================================
// BLOCKS
// =============================================================================

/// One entry of a `block_data` scan, in scan order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlockEntry {
    /// Raw store key: `containerID|localID`, a JSON object, or opaque.
    pub key: String,
    /// Raw block metadata.
    pub record: Value,
}

impl RawBlockEntry {
    pub fn new(key: impl Into<String>, record: Value) -> Self {
        Self {
            key: key.into(),
            record,
        }
    }
}

/// Result of scanning one block store.
pub type BlockScan = Vec<RawBlockEntry>;

/// A scanned block whose composite key has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBlock {
    pub key: BlockKey,
    pub metadata: Map<String, Value>,
}

impl DecodedBlock {
    /// Non-object records are kept under a `value` field.
    pub fn new(key: BlockKey, record: Value) -> Self {
        let mut metadata = match record {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        for field in COMPUTED_BLOCK_FIELDS {
            metadata.remove(field);
        }
        Self { key, metadata }
    }
}

/// Block metadata annotated by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockRecord {
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
    /// `chunksPath/localID.block`
    #[serde(rename = "blockFile")]
    pub block_file: String,
    #[serde(rename = "blockFileExists")]
    pub block_file_exists: bool,
}

// =============================================================================
// CONTAINER REPORT
// =============================================================================

/// Reconciliation result of one container.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerOutcome {
    Reconciled {
        blocks: BTreeMap<LocalId, BlockRecord>,
        orphaned_blocks: BTreeSet<PathBuf>,
    },
    Failed(ContainerFailure),
}

/// The enriched container. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerReport {
    pub container: ContainerDescriptor,
    pub outcome: ContainerOutcome,
}

impl ContainerReport {
    pub fn reconciled(
        container: ContainerDescriptor,
        blocks: BTreeMap<LocalId, BlockRecord>,
        orphaned_blocks: BTreeSet<PathBuf>,
    ) -> Self {
        Self {
            container,
            outcome: ContainerOutcome::Reconciled {
                blocks,
                orphaned_blocks,
            },
        }
    }

    pub fn failed(container: ContainerDescriptor, failure: ContainerFailure) -> Self {
        Self {
            container,
            outcome: ContainerOutcome::Failed(failure),
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container.container_id
    }

    pub fn blocks(&self) -> Option<&BTreeMap<LocalId, BlockRecord>> {
        match &self.outcome {
            ContainerOutcome::Reconciled { blocks, .. } => Some(blocks),
            ContainerOutcome::Failed(_) => None,
        }
    }

    pub fn orphaned_blocks(&self) -> Option<&BTreeSet<PathBuf>> {
        match &self.outcome {
            ContainerOutcome::Reconciled {
                orphaned_blocks, ..
            } => Some(orphaned_blocks),
            ContainerOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ContainerFailure> {
        match &self.outcome {
            ContainerOutcome::Failed(failure) => Some(failure),
            ContainerOutcome::Reconciled { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct FailureMarker<'a> {
    kind: &'a str,
    message: String,
}

impl Serialize for ContainerReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let container = &self.container;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("containerID", &container.container_id)?;
        map.serialize_entry("containerPath", &container.container_path)?;
        map.serialize_entry("chunksPath", &container.chunks_path)?;
        map.serialize_entry("dbFile", &container.db_file)?;
        for (name, value) in &container.extra {
            if !RESERVED_REPORT_FIELDS.contains(&name.as_str()) {
                map.serialize_entry(name, value)?;
            }
        }
        match &self.outcome {
            ContainerOutcome::Reconciled {
                blocks,
                orphaned_blocks,
            } => {
                let orphaned: Vec<_> = orphaned_blocks
                    .iter()
                    .map(|path| path.to_string_lossy())
                    .collect();
                map.serialize_entry("blocks", blocks)?;
                map.serialize_entry("orphanedBlocks", &orphaned)?;
            }
            ContainerOutcome::Failed(failure) => {
                let marker = FailureMarker {
                    kind: failure.kind(),
                    message: failure.to_string(),
                };
                map.serialize_entry("error", &marker)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::StoreScanError;
    use serde_json::json;

    #[test]
    fn test_descriptor_keeps_unknown_fields() {
        let descriptor: ContainerDescriptor = serde_json::from_value(json!({
            "containerID": 7,
            "containerPath": "/data/7",
            "chunksPath": "/data/7/chunks",
            "dbFile": "/data/db/container.db",
            "state": "CLOSED",
            "layOutVersion": 2
        }))
        .unwrap();

        assert_eq!(descriptor.container_id, "7");
        assert_eq!(descriptor.extra.get("state"), Some(&json!("CLOSED")));
        assert_eq!(descriptor.extra.get("layOutVersion"), Some(&json!(2)));
        assert!(!descriptor.extra.contains_key("dbFile"));
    }

    #[test]
    fn test_descriptor_requires_paths() {
        let result: Result<ContainerDescriptor, _> = serde_json::from_value(json!({
            "containerID": 7,
            "containerPath": "/data/7"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_decoded_block_strips_computed_fields() {
        let key = BlockKey::new("7", "42");
        let block = DecodedBlock::new(
            key,
            json!({"size": 10, "blockFile": "/elsewhere", "blockFileExists": true}),
        );
        assert_eq!(block.metadata.len(), 1);
        assert_eq!(block.metadata.get("size"), Some(&json!(10)));
    }

    #[test]
    fn test_decoded_block_wraps_scalar_record() {
        let block = DecodedBlock::new(BlockKey::new("7", "42"), json!("opaque"));
        assert_eq!(block.metadata.get("value"), Some(&json!("opaque")));
    }

    #[test]
    fn test_reconciled_report_serialization() {
        let container = ContainerDescriptor::new("7", "/data/7", "/data/7/chunks", "/db/7")
            .with_field("state", json!("OPEN"));
        let mut metadata = Map::new();
        metadata.insert("size".to_string(), json!(4096));
        let mut blocks = BTreeMap::new();
        blocks.insert(
            "42".to_string(),
            BlockRecord {
                metadata,
                block_file: "/data/7/chunks/42.block".to_string(),
                block_file_exists: true,
            },
        );
        let orphans = BTreeSet::from([PathBuf::from("/data/7/chunks/99.block")]);
        let report = ContainerReport::reconciled(container, blocks, orphans);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["containerID"], json!("7"));
        assert_eq!(value["chunksPath"], json!("/data/7/chunks"));
        assert_eq!(value["state"], json!("OPEN"));
        assert_eq!(value["blocks"]["42"]["size"], json!(4096));
        assert_eq!(value["blocks"]["42"]["blockFileExists"], json!(true));
        assert_eq!(
            value["blocks"]["42"]["blockFile"],
            json!("/data/7/chunks/42.block")
        );
        assert_eq!(value["orphanedBlocks"], json!(["/data/7/chunks/99.block"]));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failed_report_has_error_marker_only() {
        let container = ContainerDescriptor::new("8", "/data/8", "/data/8/chunks", "/db/8");
        let report = ContainerReport::failed(
            container,
            ContainerFailure::StoreScan {
                db_file: "/db/8".to_string(),
                source: StoreScanError::Unavailable("corrupt".to_string()),
            },
        );

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["error"]["kind"], json!("StoreScanFailure"));
        assert!(value["error"]["message"]
            .as_str()
            .unwrap()
            .contains("corrupt"));
        assert!(value.get("blocks").is_none());
        assert!(value.get("orphanedBlocks").is_none());
    }

    #[test]
    fn test_pass_through_cannot_shadow_report_fields() {
        let container = ContainerDescriptor::new("9", "/data/9", "/data/9/chunks", "/db/9")
            .with_field("blocks", json!("stale"));
        let report = ContainerReport::reconciled(container, BTreeMap::new(), BTreeSet::new());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["blocks"], json!({}));
    }
}
