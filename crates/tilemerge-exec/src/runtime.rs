//! Runtime: pull a join tree to completion and emit a RunManifest.
//!
//! Behavior:
//! - Applies the engine's `EngineConfig` to every merge join it builds.
//! - Pulls the root until it reports end of stream; each tile is moved out
//!   with `take_output` and kept in emission order.
//! - Stamps the manifest with a stable plan hash and an output digest so two
//!   runs over the same inputs can be compared.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use tilemerge_core::config::EngineConfig;
use tilemerge_core::hash::{hash_serde, hash_tiles};
use tilemerge_core::manifest::RunManifest;
use tilemerge_core::tile::LogicalTile;

use tilemerge_operators::expr::EvalContext;
use tilemerge_operators::trace::emit_span;
use tilemerge_operators::{Executor, JoinStats, MergeJoinExecutor, MergeJoinPlan, OpError};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("operator exec: {0}")]
    Operator(#[from] OpError),
    #[error("invalid plan: {0}")]
    Invalid(String),
    #[error("hashing error: {0}")]
    Hash(String),
}

/// Everything a finished run hands back.
#[derive(Debug)]
pub struct RunReport {
    pub manifest: RunManifest,
    pub tiles: Vec<LogicalTile>,
    pub stats: JoinStats,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.tiles.iter().map(|t| t.row_count()).sum()
    }

    pub fn manifest_json(&self) -> Result<String, ExecError> {
        serde_json::to_string_pretty(&self.manifest).map_err(|e| ExecError::Hash(e.to_string()))
    }
}

/// Engine owns the configuration every operator it builds runs with.
pub struct Engine {
    cfg: EngineConfig,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Build a merge join over two children under this engine's config.
    pub fn merge_join(
        &self,
        plan: MergeJoinPlan,
        left: Box<dyn Executor>,
        right: Box<dyn Executor>,
        ctx: EvalContext,
    ) -> Result<MergeJoinExecutor, ExecError> {
        Ok(MergeJoinExecutor::new(plan, left, right)?
            .with_config(self.cfg.clone())
            .with_context(ctx))
    }

    /// Drain `join` and return its output with a manifest.
    pub fn run(&self, mut join: MergeJoinExecutor) -> Result<RunReport, ExecError> {
        let plan_hash = hash_serde(join.plan()).map_err(|e| ExecError::Hash(e.to_string()))?;
        let mut manifest = RunManifest::new(plan_hash, now_millis());

        let tiles = drain(&mut join)?;

        manifest.output_tiles = tiles.len() as u64;
        manifest.output_rows = tiles.iter().map(|t| t.row_count() as u64).sum();
        let digest = hash_tiles(&tiles);
        manifest = manifest.finish(now_millis(), Some(digest));

        emit_span(
            "engine.run_finished",
            &[
                ("tiles", manifest.output_tiles.to_string()),
                ("rows", manifest.output_rows.to_string()),
                ("digest", digest.to_hex()),
            ],
        );

        Ok(RunReport {
            manifest,
            tiles,
            stats: *join.stats(),
        })
    }
}

/// Pull `root` until end of stream, taking ownership of every tile.
pub fn drain<E: Executor + ?Sized>(root: &mut E) -> Result<Vec<LogicalTile>, ExecError> {
    let mut tiles = Vec::new();
    while root.pull()? {
        let tile = root.take_output().ok_or_else(|| {
            ExecError::Invalid(format!("{} reported a tile but handed out none", root.name()))
        })?;
        tiles.push(tile);
    }
    Ok(tiles)
}

// --- helpers ---

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
