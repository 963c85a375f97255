#![forbid(unsafe_code)]
//! tilemerge-operators: pull-based operators over logical tiles.
//!
//! Design intent:
//! - Pure and synchronous; one pull runs to completion without yielding.
//! - Operators pass tiles by value. Whoever holds a `LogicalTile` owns it.
//! - Expressions are a closed enum evaluated against zero-copy row views.

pub mod bridge;
pub mod expr;
pub mod plan;
pub mod scan;
pub mod trace;
pub mod traits;

pub mod join;

pub use expr::{CmpOp, EvalContext, Expr, ExprError, Side};
pub use join::{JoinStats, MergeJoinExecutor};
pub use plan::{JoinClause, MergeJoinPlan};
pub use scan::TileScan;
pub use traits::{Executor, OpError};
