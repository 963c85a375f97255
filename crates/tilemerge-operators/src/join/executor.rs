//! Merge-join operator: pulls tile pairs from its children and merges them.
//!
//! Each pull takes one tile from the right child, then one from the left, and
//! merges the pair completely. A pair that produces no rows is not an answer:
//! the operator moves on to the next pair in the same pull. Left exhaustion
//! ends the stream quietly; right exhaustion is reported as an error unless
//! `EngineConfig::strict_right_exhaustion` is off.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use tilemerge_core::config::EngineConfig;
use tilemerge_core::tile::LogicalTile;

use crate::expr::{EvalContext, Side};
use crate::join::assemble::OutputAssembler;
use crate::join::group::key_order;
use crate::join::merge::MergeDriver;
use crate::plan::{JoinClause, MergeJoinPlan};
use crate::trace::emit_span;
use crate::traits::{Executor, OpError};

/// Running totals across every pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    pub tile_pairs: u64,
    /// Pairs that matched nothing and were retried with the next pair.
    pub empty_pairs: u64,
    pub matched_groups: u64,
    pub discarded_groups: u64,
    pub rows_emitted: u64,
    pub tiles_emitted: u64,
}

pub struct MergeJoinExecutor {
    plan: MergeJoinPlan,
    left: Box<dyn Executor>,
    right: Box<dyn Executor>,
    config: EngineConfig,
    ctx: EvalContext,
    output: Option<LogicalTile>,
    stats: JoinStats,
    exhausted: bool,
}

impl MergeJoinExecutor {
    pub fn new(
        plan: MergeJoinPlan,
        left: Box<dyn Executor>,
        right: Box<dyn Executor>,
    ) -> Result<Self, OpError> {
        plan.validate()?;
        Ok(Self {
            plan,
            left,
            right,
            config: EngineConfig::default(),
            ctx: EvalContext::default(),
            output: None,
            stats: JoinStats::default(),
            exhausted: false,
        })
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Parameters visible to the residual predicate.
    pub fn with_context(mut self, ctx: EvalContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn plan(&self) -> &MergeJoinPlan {
        &self.plan
    }

    pub fn stats(&self) -> &JoinStats {
        &self.stats
    }

    /// Next (left, right) tile pair, or `None` at end of stream.
    fn next_pair(&mut self) -> Result<Option<(LogicalTile, LogicalTile)>, OpError> {
        if !self.right.pull()? {
            emit_span(
                "merge_join.right_exhausted",
                &[("tile_pairs", self.stats.tile_pairs.to_string())],
            );
            if self.config.strict_right_exhaustion {
                return Err(OpError::RightExhausted);
            }
            return Ok(None);
        }
        let right = self
            .right
            .take_output()
            .ok_or_else(|| OpError::Exec("right child reported a tile but handed out none".into()))?;

        if !self.left.pull()? {
            emit_span(
                "merge_join.left_exhausted",
                &[("tile_pairs", self.stats.tile_pairs.to_string())],
            );
            return Ok(None);
        }
        let left = self
            .left
            .take_output()
            .ok_or_else(|| OpError::Exec("left child reported a tile but handed out none".into()))?;

        Ok(Some((left, right)))
    }

    /// Run one full merge pass; `None` when the pair produced no rows.
    fn merge_pair(
        &mut self,
        left: LogicalTile,
        right: LogicalTile,
    ) -> Result<Option<LogicalTile>, OpError> {
        check_input(&left, Side::Left)?;
        check_input(&right, Side::Right)?;
        if self.config.verify_sorted_inputs {
            check_sorted(&left, Side::Left, &self.plan.clauses)?;
            check_sorted(&right, Side::Right, &self.plan.clauses)?;
        }

        let mut out = OutputAssembler::new(&left, &right, self.config.position_list_capacity);
        let pass = MergeDriver::new(&self.plan.clauses, self.plan.predicate.as_ref())
            .with_context(&self.ctx)
            .run(&left, &right, &mut out)?;

        self.stats.tile_pairs += 1;
        self.stats.matched_groups += pass.matched_groups;
        self.stats.discarded_groups += pass.discarded_groups;
        self.stats.rows_emitted += pass.rows_emitted;

        emit_span(
            "merge_join.pair",
            &[
                ("left_rows", left.row_count().to_string()),
                ("right_rows", right.row_count().to_string()),
                ("rows_out", pass.rows_emitted.to_string()),
                ("matched_groups", pass.matched_groups.to_string()),
                ("discarded_groups", pass.discarded_groups.to_string()),
            ],
        );

        out.finish()
    }
}

impl Executor for MergeJoinExecutor {
    fn name(&self) -> &'static str {
        "join_merge"
    }

    fn pull(&mut self) -> Result<bool, OpError> {
        if self.exhausted {
            return Ok(false);
        }
        // Keep taking pairs until one produces rows or a child runs dry.
        loop {
            let Some((left, right)) = self.next_pair()? else {
                self.exhausted = true;
                return Ok(false);
            };
            match self.merge_pair(left, right)? {
                Some(tile) => {
                    self.stats.tiles_emitted += 1;
                    self.output = Some(tile);
                    return Ok(true);
                }
                None => self.stats.empty_pairs += 1,
            }
        }
    }

    fn take_output(&mut self) -> Option<LogicalTile> {
        self.output.take()
    }
}

/// Reject tiles the merge cannot address: no columns, or broken invariants.
fn check_input(tile: &LogicalTile, side: Side) -> Result<(), OpError> {
    if tile.column_count() == 0 || tile.position_lists().is_empty() {
        return Err(OpError::Malformed {
            side,
            reason: "tile has no columns".into(),
        });
    }
    tile.validate().map_err(|e| OpError::Malformed {
        side,
        reason: e.to_string(),
    })
}

fn check_sorted(tile: &LogicalTile, side: Side, clauses: &[JoinClause]) -> Result<(), OpError> {
    for row in 1..tile.row_count() {
        if key_order(tile, row - 1, row, side, clauses)? == Ordering::Greater {
            return Err(OpError::Unsorted { side, row });
        }
    }
    Ok(())
}
