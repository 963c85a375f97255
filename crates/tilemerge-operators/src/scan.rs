//! Source operator that hands out a fixed queue of tiles.

use std::collections::VecDeque;
use std::sync::Arc;

use tilemerge_core::tile::LogicalTile;
use tilemerge_core::types::RowBatch;

use crate::traits::{Executor, OpError};

/// Yields its tiles one per pull, in order, then reports exhaustion.
#[derive(Debug, Default)]
pub struct TileScan {
    pending: VecDeque<LogicalTile>,
    output: Option<LogicalTile>,
}

impl TileScan {
    pub fn new(tiles: impl IntoIterator<Item = LogicalTile>) -> Self {
        Self {
            pending: tiles.into_iter().collect(),
            output: None,
        }
    }

    /// Wrap each physical batch as a tile with identity position lists.
    pub fn from_batches(batches: impl IntoIterator<Item = RowBatch>) -> Result<Self, OpError> {
        let tiles = batches
            .into_iter()
            .map(|b| LogicalTile::from_batch(Arc::new(b)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(tiles))
    }
}

impl Executor for TileScan {
    fn name(&self) -> &'static str {
        "tile_scan"
    }

    fn pull(&mut self) -> Result<bool, OpError> {
        self.output = self.pending.pop_front();
        Ok(self.output.is_some())
    }

    fn take_output(&mut self) -> Option<LogicalTile> {
        self.output.take()
    }
}
