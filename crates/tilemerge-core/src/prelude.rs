//! Convenient re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::tile::{ColumnInfo, LogicalTile, RowView};
pub use crate::types::{Column, RowBatch, Scalar};
