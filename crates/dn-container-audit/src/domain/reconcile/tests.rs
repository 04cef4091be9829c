//! # Reconciler Tests

use super::*;
use crate::domain::block_key::BlockKey;
use proptest::prelude::*;
use serde_json::json;

fn container_seven() -> ContainerDescriptor {
    ContainerDescriptor::new("7", "/data/7", "/data/7/chunks", "/db/7")
}

fn record(local_id: &str) -> DecodedBlock {
    DecodedBlock::new(
        BlockKey::new("7", local_id),
        json!({"blockID": {"containerBlockID": {"containerID": 7, "localID": local_id}}}),
    )
}

fn files(paths: &[&str]) -> BTreeSet<PathBuf> {
    paths.iter().map(PathBuf::from).collect()
}

#[test]
fn test_block_file_path() {
    assert_eq!(
        block_file_path("/data/7/chunks", "42"),
        "/data/7/chunks/42.block"
    );
}

#[test]
fn test_claimed_block_and_orphan() {
    let on_disk = files(&["/data/7/chunks/42.block", "/data/7/chunks/99.block"]);

    let result = reconcile_container(&container_seven(), &on_disk, &[record("42")], false);

    let block = &result.blocks["42"];
    assert!(block.block_file_exists);
    assert_eq!(block.block_file, "/data/7/chunks/42.block");
    assert_eq!(result.orphaned_blocks, files(&["/data/7/chunks/99.block"]));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_dangling_metadata_is_flag_only() {
    let result = reconcile_container(&container_seven(), &BTreeSet::new(), &[record("42")], false);

    assert!(!result.blocks["42"].block_file_exists);
    assert!(result.orphaned_blocks.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_dangling_metadata_escalated() {
    let result = reconcile_container(&container_seven(), &BTreeSet::new(), &[record("42")], true);

    assert_eq!(
        result.warnings,
        vec![ConsistencyWarning::DanglingMetadata {
            container_id: "7".to_string(),
            local_id: "42".to_string(),
            block_file: "/data/7/chunks/42.block".to_string(),
        }]
    );
}

#[test]
fn test_empty_container() {
    let result = reconcile_container(&container_seven(), &BTreeSet::new(), &[], false);
    assert!(result.blocks.is_empty());
    assert!(result.orphaned_blocks.is_empty());
}

#[test]
fn test_duplicate_local_id_last_write_wins() {
    let on_disk = files(&["/data/7/chunks/42.block"]);
    let first = DecodedBlock::new(BlockKey::new("7", "42"), json!({"size": 1}));
    let second = DecodedBlock::new(BlockKey::new("7", "42"), json!({"size": 2}));

    let result = reconcile_container(&container_seven(), &on_disk, &[first, second], false);

    let block = &result.blocks["42"];
    assert_eq!(block.metadata["size"], json!(2));
    assert!(block.block_file_exists);
    assert!(result.orphaned_blocks.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind(), "DuplicateLocalId");
}

#[test]
fn test_block_file_outside_chunks_path_is_orphaned() {
    // Same file name, different directory: not claimed.
    let on_disk = files(&["/data/7/other/42.block"]);

    let result = reconcile_container(&container_seven(), &on_disk, &[record("42")], false);

    assert!(!result.blocks["42"].block_file_exists);
    assert_eq!(result.orphaned_blocks, on_disk);
}

#[test]
fn test_relative_chunks_path_does_not_match_absolute_enumeration() {
    let container = ContainerDescriptor::new("7", "/data/7", "data/7/chunks", "/db/7");
    let on_disk = files(&["/data/7/chunks/42.block"]);

    let result = reconcile_container(&container, &on_disk, &[record("42")], false);

    assert!(!result.blocks["42"].block_file_exists);
    assert_eq!(result.orphaned_blocks.len(), 1);
}

#[test]
fn test_trailing_slash_in_chunks_path() {
    let container = ContainerDescriptor::new("7", "/data/7", "/data/7/chunks/", "/db/7");
    let on_disk = files(&["/data/7/chunks/42.block"]);

    let result = reconcile_container(&container, &on_disk, &[record("42")], false);

    assert_eq!(result.blocks["42"].block_file, "/data/7/chunks//42.block");
    assert!(!result.blocks["42"].block_file_exists);
    assert_eq!(result.orphaned_blocks, on_disk);
}

#[test]
fn test_trailing_slash_matches_when_enumerated_verbatim() {
    let container = ContainerDescriptor::new("7", "/data/7", "/data/7/chunks/", "/db/7");
    let on_disk = files(&["/data/7/chunks//42.block"]);

    let result = reconcile_container(&container, &on_disk, &[record("42")], false);

    assert!(result.blocks["42"].block_file_exists);
    assert!(result.orphaned_blocks.is_empty());
}

proptest! {
    #[test]
    fn prop_claimed_and_orphaned_partition_the_enumeration(
        on_disk_ids in proptest::collection::btree_set(0u32..64, 0..24),
        record_ids in proptest::collection::vec(0u32..64, 0..24),
    ) {
        let container = container_seven();
        let on_disk: BTreeSet<PathBuf> = on_disk_ids
            .iter()
            .map(|id| PathBuf::from(block_file_path(&container.chunks_path, &id.to_string())))
            .collect();
        let records: Vec<_> = record_ids.iter().map(|id| record(&id.to_string())).collect();

        let result = reconcile_container(&container, &on_disk, &records, false);

        let claimed: BTreeSet<PathBuf> = result
            .blocks
            .values()
            .filter(|b| b.block_file_exists)
            .map(|b| PathBuf::from(&b.block_file))
            .collect();

        for block in result.blocks.values() {
            let path = PathBuf::from(&block.block_file);
            prop_assert!(!result.orphaned_blocks.contains(&path));
            prop_assert_eq!(block.block_file_exists, on_disk.contains(&path));
        }
        prop_assert!(claimed.is_disjoint(&result.orphaned_blocks));
        let union: BTreeSet<PathBuf> = claimed.union(&result.orphaned_blocks).cloned().collect();
        prop_assert_eq!(union, on_disk);
    }
}
