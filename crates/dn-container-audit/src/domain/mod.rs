//! # Domain Layer
//!
//! Pure reconciliation logic. No I/O happens here.
//!
//! ## Modules
//!
//! - `entities` - Containers, block records, container reports
//! - `block_key` - Composite block key decoding
//! - `partition` - Routing scanned records to their containers
//! - `reconcile` - The per-container reconciler
//! - `report` - Report assembly and summary
//! - `warnings` - Metadata consistency warnings
//! - `errors` - Error taxonomy
//! - `config` - Run configuration

pub mod block_key;
pub mod config;
pub mod entities;
pub mod errors;
pub mod partition;
pub mod reconcile;
pub mod report;
pub mod warnings;
