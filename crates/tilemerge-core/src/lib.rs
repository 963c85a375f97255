#![forbid(unsafe_code)]
//! tilemerge-core: shared data model for the tilemerge join engine.
//!
//! - `types`: scalar values and the physical `RowBatch` storage.
//! - `tile`: logical tiles (position-list views over physical batches) and
//!   zero-copy row views.
//! - `config`, `error`, `hash`, `manifest`: ambient pieces every crate uses.

pub mod config;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod prelude;
pub mod schema;
pub mod tile;
pub mod types;

/// Engine version string stamped into run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
