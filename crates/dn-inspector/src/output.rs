//! # Report Output
//!
//! Reports are pretty-printed JSON with four-space indentation.
//!
//! | Destination | Written to |
//! |-------------|------------|
//! | `Stdout` | standard output |
//! | `File` | the report file (default `report.json`), replaced if present |
//! | split dir | one `container_<id>.json` per container, in addition |

use anyhow::{Context, Result};
use dn_container_audit::Report;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_REPORT_FILE: &str = "report.json";

const INDENT: &[u8] = b"    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

/// Serialize `value` as indented JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<()> {
    let mut serializer =
        Serializer::with_formatter(&mut *writer, PrettyFormatter::with_indent(INDENT));
    value
        .serialize(&mut serializer)
        .context("failed to encode report")?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write the whole report to `destination`.
pub fn emit_report(report: &Report, destination: &Destination) -> Result<()> {
    match destination {
        Destination::Stdout => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_json(&mut out, report)?;
            out.flush().context("failed to flush standard output")?;
        }
        Destination::File(path) => {
            write_file(path, report)?;
            info!(path = %path.display(), containers = report.len(), "report written");
        }
    }
    Ok(())
}

/// Write `container_<id>.json` for every container into `dir`, creating it
/// if needed. Each file holds `{ "<id>": <container report> }`.
pub fn write_split_reports(report: &Report, dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut written = 0;
    for (container_id, container) in report.containers() {
        if container_id.is_empty() || container_id.contains(['/', '\\']) || container_id == ".." {
            warn!(
                container_id = %container_id,
                "container id is not a safe file name; skipping split report"
            );
            continue;
        }
        let path = dir.join(format!("container_{}.json", container_id));
        let single: BTreeMap<&str, _> = BTreeMap::from([(container_id.as_str(), container)]);
        write_file(&path, &single)?;
        written += 1;
    }

    info!(dir = %dir.display(), files = written, "per-container reports written");
    Ok(written)
}

fn write_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_json(&mut writer, value).with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dn_container_audit::{
        ContainerDescriptor, ContainerFailure, ContainerReport, ReportAssembler,
    };
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn report() -> Report {
        let catalog = vec![
            ContainerDescriptor::new("1", "/data/1", "/data/1/chunks", "/db/1"),
            ContainerDescriptor::new("2", "/data/2", "/data/2/chunks", "/db/1"),
        ];
        let mut assembler = ReportAssembler::new();
        assembler.insert(ContainerReport::reconciled(
            catalog[0].clone(),
            Default::default(),
            BTreeSet::from([PathBuf::from("/data/1/chunks/5.block")]),
        ));
        assembler.finish(&catalog, ContainerFailure::Cancelled)
    }

    #[test]
    fn test_four_space_indentation() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &report()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("{\n    \"1\": {\n        \"containerID\": \"1\""));
        assert!(text.ends_with("}\n"));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["1"]["orphanedBlocks"][0], "/data/1/chunks/5.block");
        assert_eq!(parsed["2"]["error"]["kind"], "Cancelled");
    }

    #[test]
    fn test_report_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, "stale contents that are longer than the report itself").unwrap();

        emit_report(&report(), &Destination::File(path.clone())).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_split_reports() {
        let dir = TempDir::new().unwrap();
        let split = dir.path().join("split");

        let written = write_split_reports(&report(), &split).unwrap();

        assert_eq!(written, 2);
        let one: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(split.join("container_1.json")).unwrap())
                .unwrap();
        assert_eq!(one["1"]["chunksPath"], "/data/1/chunks");
        assert!(split.join("container_2.json").exists());
    }

    #[test]
    fn test_unwritable_report_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("report.json");
        assert!(emit_report(&report(), &Destination::File(path)).is_err());
    }
}
