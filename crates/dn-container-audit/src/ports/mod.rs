//! # Ports Layer
//!
//! - `inbound.rs` - Driving port (the audit API exposed to the command surface)
//! - `outbound.rs` - Driven ports (catalog, block store, filesystem)

pub mod inbound;
pub mod outbound;
