//! # Report Assembly
//!
//! Folds per-container reports into the run's `Report`. Every catalog
//! container gets an entry, so "no blocks" stays distinguishable from
//! "not processed".

use crate::domain::entities::{ContainerDescriptor, ContainerId, ContainerReport};
use crate::domain::errors::ContainerFailure;
use crate::domain::warnings::ConsistencyWarning;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

// =============================================================================
// REPORT
// =============================================================================

/// Terminal artifact: container id -> container report.
///
/// Serializes as the container mapping alone; warnings are run metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    containers: BTreeMap<ContainerId, ContainerReport>,
    warnings: Vec<ConsistencyWarning>,
}

impl Report {
    pub fn containers(&self) -> &BTreeMap<ContainerId, ContainerReport> {
        &self.containers
    }

    pub fn get(&self, container_id: &str) -> Option<&ContainerReport> {
        self.containers.get(container_id)
    }

    pub fn warnings(&self) -> &[ConsistencyWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Containers without a reconciliation result.
    pub fn failures(&self) -> impl Iterator<Item = (&ContainerId, &ContainerFailure)> {
        self.containers
            .iter()
            .filter_map(|(id, report)| report.failure().map(|failure| (id, failure)))
    }

    /// True when every container was reconciled.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.containers.serialize(serializer)
    }
}

// =============================================================================
// ASSEMBLER
// =============================================================================

#[derive(Debug, Default)]
pub struct ReportAssembler {
    containers: BTreeMap<ContainerId, ContainerReport>,
    warnings: Vec<ConsistencyWarning>,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, report: ContainerReport) {
        let container_id = report.container_id().to_string();
        if self.containers.insert(container_id.clone(), report).is_some() {
            tracing::warn!(
                container_id = %container_id,
                "container reported twice; keeping the later report"
            );
        }
    }

    pub fn add_warnings(&mut self, warnings: impl IntoIterator<Item = ConsistencyWarning>) {
        self.warnings.extend(warnings);
    }

    /// Close the report. Catalog containers without an entry are recorded as
    /// failed with `missing`.
    pub fn finish(mut self, catalog: &[ContainerDescriptor], missing: ContainerFailure) -> Report {
        for container in catalog {
            if !self.containers.contains_key(&container.container_id) {
                self.containers.insert(
                    container.container_id.clone(),
                    ContainerReport::failed(container.clone(), missing.clone()),
                );
            }
        }
        Report {
            containers: self.containers,
            warnings: self.warnings,
        }
    }
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Counts over a finished report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub containers: usize,
    pub reconciled: usize,
    pub failed: usize,
    pub blocks: usize,
    pub dangling_blocks: usize,
    pub orphaned_blocks: usize,
    pub warnings: usize,
}

impl AuditSummary {
    pub fn from_report(report: &Report) -> Self {
        let mut summary = Self {
            containers: report.len(),
            warnings: report.warnings().len(),
            ..Self::default()
        };
        for container in report.containers().values() {
            match (container.blocks(), container.orphaned_blocks()) {
                (Some(blocks), Some(orphaned)) => {
                    summary.reconciled += 1;
                    summary.blocks += blocks.len();
                    summary.dangling_blocks +=
                        blocks.values().filter(|b| !b.block_file_exists).count();
                    summary.orphaned_blocks += orphaned.len();
                }
                _ => summary.failed += 1,
            }
        }
        summary
    }

    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }
}
