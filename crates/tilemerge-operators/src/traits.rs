//! Operator trait + common interfaces.
//!
//! Operators are pulled by their parent: `pull` does the work and reports
//! whether a tile is ready, `take_output` moves that tile to the caller.

use thiserror::Error;

use tilemerge_core::tile::LogicalTile;

use crate::expr::{ExprError, Side};

#[derive(Debug, Error)]
pub enum OpError {
    #[error("planning error: {0}")]
    Plan(String),

    #[error("execution error: {0}")]
    Exec(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("expression error: {0}")]
    Expr(#[from] ExprError),

    #[error("malformed tile from {side} child: {reason}")]
    Malformed { side: Side, reason: String },

    #[error("{side} input is not sorted on the join keys at row {row}")]
    Unsorted { side: Side, row: usize },

    #[error("right child is exhausted")]
    RightExhausted,

    #[error(transparent)]
    Core(#[from] tilemerge_core::error::Error),
}

/// Trait that all pull-based operators implement.
///
/// Contract:
/// - `pull` returns `Ok(true)` when a tile is ready and `Ok(false)` once the
///   stream is exhausted. Errors are terminal.
/// - After `Ok(true)`, `take_output` yields the tile exactly once; the
///   operator keeps no reference to it.
pub trait Executor: Send {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    fn pull(&mut self) -> Result<bool, OpError>;

    fn take_output(&mut self) -> Option<LogicalTile>;
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn pull(&mut self) -> Result<bool, OpError> {
        (**self).pull()
    }

    fn take_output(&mut self) -> Option<LogicalTile> {
        (**self).take_output()
    }
}
