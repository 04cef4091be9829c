//! # Publish Tests
//!
//! Runs the command surface against an in-memory node and checks the written
//! report files and run status.

use clap::Parser;
use dn_container_audit::{
    AuditConfig, AuditDependencies, ContainerAuditService, ContainerDescriptor, InMemoryBlockFiles,
    InMemoryBlockStore, InMemoryCatalog,
};
use dn_inspector::{audit_and_publish, Args, RunStatus};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

type MemoryService = ContainerAuditService<InMemoryCatalog, InMemoryBlockStore, InMemoryBlockFiles>;

fn service(catalog: InMemoryCatalog, files: InMemoryBlockFiles) -> MemoryService {
    let store = InMemoryBlockStore::new()
        .with_entry(
            "/db/1",
            "1|10",
            json!({"blockID": {"containerBlockID": {"containerID": 1, "localID": 10}}}),
        )
        .with_empty_store("/db/2");
    ContainerAuditService::new(
        AuditDependencies {
            catalog: Arc::new(catalog),
            block_source: Arc::new(store),
            block_files: Arc::new(files),
        },
        AuditConfig {
            workers: 2,
            ..AuditConfig::default()
        },
    )
}

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(vec![
        ContainerDescriptor::new("1", "/data/1", "/data/1/chunks", "/db/1"),
        ContainerDescriptor::new("2", "/data/2", "/data/2/chunks", "/db/2"),
    ])
}

fn args(extra: &[&str]) -> Args {
    let mut argv = vec!["dn-inspector"];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv).unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_complete_run_writes_report_file() {
    let dir = TempDir::new().unwrap();
    let report_file = dir.path().join("report.json");
    let files = InMemoryBlockFiles::new()
        .with_tree("/data/1", ["/data/1/chunks/10.block", "/data/1/chunks/11.block"])
        .with_tree("/data/2", Vec::<PathBuf>::new());
    let args = args(&["--report-file", report_file.to_str().unwrap()]);

    let status = audit_and_publish(&service(catalog(), files), &args, watch::channel(false).1)
        .await
        .unwrap();

    assert_eq!(status, RunStatus::Complete);
    let report = read_json(&report_file);
    assert_eq!(report["1"]["blocks"]["10"]["blockFileExists"], true);
    assert_eq!(report["1"]["orphanedBlocks"], json!(["/data/1/chunks/11.block"]));
    assert_eq!(report["2"]["blocks"], json!({}));
}

#[tokio::test]
async fn test_failed_container_is_partial() {
    let dir = TempDir::new().unwrap();
    let report_file = dir.path().join("report.json");
    let files = InMemoryBlockFiles::new().with_tree("/data/1", ["/data/1/chunks/10.block"]);
    let args = args(&["--report-file", report_file.to_str().unwrap()]);

    let status = audit_and_publish(&service(catalog(), files), &args, watch::channel(false).1)
        .await
        .unwrap();

    assert_eq!(status, RunStatus::Partial { failed: 1 });
    let report = read_json(&report_file);
    assert_eq!(report["2"]["error"]["kind"], "FilesystemEnumerationFailure");
    assert_eq!(report["1"]["blocks"]["10"]["blockFileExists"], true);
}

#[tokio::test]
async fn test_split_dir_gets_one_file_per_container() {
    let dir = TempDir::new().unwrap();
    let report_file = dir.path().join("report.json");
    let split_dir = dir.path().join("containers");
    let files = InMemoryBlockFiles::new()
        .with_tree("/data/1", Vec::<PathBuf>::new())
        .with_tree("/data/2", Vec::<PathBuf>::new());
    let args = args(&[
        "--report-file",
        report_file.to_str().unwrap(),
        "--split-dir",
        split_dir.to_str().unwrap(),
    ]);

    audit_and_publish(&service(catalog(), files), &args, watch::channel(false).1)
        .await
        .unwrap();

    let one = read_json(&split_dir.join("container_1.json"));
    assert_eq!(one.as_object().unwrap().len(), 1);
    assert_eq!(one["1"]["blocks"]["10"]["blockFileExists"], false);
    assert!(split_dir.join("container_2.json").exists());
    assert_eq!(read_json(&report_file).as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_catalog_failure_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let report_file = dir.path().join("report.json");
    let args = args(&["--report-file", report_file.to_str().unwrap()]);

    let result = audit_and_publish(
        &service(InMemoryCatalog::unavailable("ozone exited 1"), InMemoryBlockFiles::new()),
        &args,
        watch::channel(false).1,
    )
    .await;

    assert!(result.is_err());
    assert!(!report_file.exists());
}
