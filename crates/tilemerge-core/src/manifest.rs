//! Deterministic run manifest for audit/replay.
//!
//! The engine emits a manifest after draining a join; rerunning the same plan
//! over the same inputs must reproduce `plan_hash` and `outputs_digest`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the join plan (clauses and residual predicate).
    pub plan_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Digest of every output tile, in emission order.
    pub outputs_digest: Option<Hash256>,

    /// Number of tiles and rows handed to the caller.
    pub output_tiles: u64,
    pub output_rows: u64,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(plan_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            plan_hash,
            engine_version: crate::VERSION.to_string(),
            outputs_digest: None,
            output_tiles: 0,
            output_rows: 0,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, outputs_digest: Option<Hash256>) -> Self {
        self.finished_ms = finished_ms;
        self.outputs_digest = outputs_digest;
        self
    }
}
