//! # Adapters Module
//!
//! Implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `ozone`: catalog and block store over the `ozone debug` CLI
//! - `filesystem`: `*.block` enumeration on the local filesystem
//! - `scan_cache`: fetch-once memoization of block store scans
//! - `memory`: in-memory fakes for tests

pub mod filesystem;
pub mod memory;
#[cfg(feature = "ozone-cli")]
pub mod ozone;
pub mod scan_cache;

pub use filesystem::LocalBlockFileEnumerator;
pub use memory::{InMemoryBlockFiles, InMemoryBlockStore, InMemoryCatalog};
#[cfg(feature = "ozone-cli")]
pub use ozone::{
    parse_block_scan, parse_container_list, OzoneBlockStore, OzoneCommandConfig,
    OzoneContainerCatalog, OzoneDebugCommand,
};
pub use scan_cache::ScanCache;
