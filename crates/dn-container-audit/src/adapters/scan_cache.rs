//! # Block Store Scan Cache
//!
//! Scans each `dbFile` at most once per run, however many containers share
//! it. The scan runs in a task owned by the cache, so a container that times
//! out while waiting does not cancel it; later containers on the same store
//! wait on that same scan. A failed scan is cached too: every container on
//! that store reports the same failure without retrying.
//!
//! The cache lives for one run and is never written to disk. Dropping it
//! aborts scans nobody is waiting for any more.

use crate::domain::errors::StoreScanError;
use crate::domain::partition::{partition_scan, CatalogIndex, PartitionedScan};
use crate::domain::warnings::ConsistencyWarning;
use crate::ports::outbound::BlockMetadataSource;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, error, info};

type ScanResult = Result<Arc<PartitionedScan>, StoreScanError>;

/// One store's scan: its eventual result and the task producing it.
struct Slot {
    result: watch::Receiver<Option<ScanResult>>,
    task: AbortHandle,
}

pub struct ScanCache<B: BlockMetadataSource> {
    source: Arc<B>,
    index: Arc<CatalogIndex>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl<B: BlockMetadataSource + 'static> ScanCache<B> {
    pub fn new(source: Arc<B>, index: Arc<CatalogIndex>) -> Self {
        Self {
            source,
            index,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Partitioned scan of `db_file`, scanning the store on first use.
    pub async fn fetch(&self, db_file: &str) -> ScanResult {
        let mut result = {
            let mut slots = self.slots.lock();
            slots
                .entry(db_file.to_string())
                .or_insert_with(|| self.start_scan(db_file))
                .result
                .clone()
        };

        let finished = result
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|scan| (*scan).clone());
        finished.unwrap_or_else(|| {
            Err(StoreScanError::Unavailable(format!(
                "scan of {} ended without a result",
                db_file
            )))
        })
    }

    fn start_scan(&self, db_file: &str) -> Slot {
        let (tx, rx) = watch::channel(None);
        let source = Arc::clone(&self.source);
        let index = Arc::clone(&self.index);
        let db_file = db_file.to_string();

        let task = tokio::spawn(async move {
            let result = scan_and_partition(source.as_ref(), &db_file, &index).await;
            tx.send_replace(Some(result));
        });

        Slot {
            result: rx,
            task: task.abort_handle(),
        }
    }

    /// Stores scanned so far, including failed ones.
    pub fn scans_performed(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.result.borrow().is_some())
            .count()
    }

    /// Partitioning warnings of every successful scan.
    pub fn warnings(&self) -> Vec<ConsistencyWarning> {
        let slots = self.slots.lock();
        let mut warnings = Vec::new();
        for slot in slots.values() {
            if let Some(Ok(scan)) = &*slot.result.borrow() {
                warnings.extend_from_slice(scan.warnings());
            }
        }
        warnings
    }
}

impl<B: BlockMetadataSource> Drop for ScanCache<B> {
    fn drop(&mut self) {
        for (db_file, slot) in self.slots.get_mut().iter() {
            if slot.result.borrow().is_none() {
                debug!(db_file = %db_file, "abandoning unfinished block store scan");
            }
            slot.task.abort();
        }
    }
}

async fn scan_and_partition<B: BlockMetadataSource + ?Sized>(
    source: &B,
    db_file: &str,
    index: &CatalogIndex,
) -> ScanResult {
    debug!(db_file = %db_file, "scanning block store");
    let result = source.scan_block_store(db_file).await.map(|scan| {
        let entries = scan.len();
        let partitioned = partition_scan(db_file, scan, index);
        for warning in partitioned.warnings() {
            warning.log();
        }
        info!(
            db_file = %db_file,
            entries,
            records = partitioned.record_count(),
            "block store scanned"
        );
        Arc::new(partitioned)
    });
    if let Err(err) = &result {
        error!(db_file = %db_file, error = %err, "block store scan failed");
    }
    result
}
