//! Merge driver: one pass over a pair of sorted tiles.
//!
//! Precondition: both tiles are sorted on their side of the join clauses.
//! The driver keeps one group cursor per side and, at each step, compares the
//! first rows of both groups clause by clause. The first unequal clause moves
//! the smaller side forward. A full match emits the Cartesian product of both
//! groups (unless the residual predicate rejects the pair) and moves both.

use std::cmp::Ordering;

use tilemerge_core::tile::{LogicalTile, RowView};

use crate::expr::{EvalContext, Expr, ExprError, Side};
use crate::join::assemble::OutputAssembler;
use crate::join::group::GroupCursor;
use crate::plan::JoinClause;

/// Counters for one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub matched_groups: u64,
    pub discarded_groups: u64,
    pub rows_emitted: u64,
}

pub struct MergeDriver<'a> {
    clauses: &'a [JoinClause],
    predicate: Option<&'a Expr>,
    ctx: Option<&'a EvalContext>,
}

impl<'a> MergeDriver<'a> {
    pub fn new(clauses: &'a [JoinClause], predicate: Option<&'a Expr>) -> Self {
        Self {
            clauses,
            predicate,
            ctx: None,
        }
    }

    /// Context handed to the residual predicate (join keys never see it).
    pub fn with_context(mut self, ctx: &'a EvalContext) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Merge `left` and `right` completely, appending every match to `out`.
    pub fn run(
        &self,
        left: &LogicalTile,
        right: &LogicalTile,
        out: &mut OutputAssembler,
    ) -> Result<PassStats, ExprError> {
        let mut stats = PassStats::default();
        let mut lc = GroupCursor::first(left, Side::Left, self.clauses)?;
        let mut rc = GroupCursor::first(right, Side::Right, self.clauses)?;

        while !lc.is_empty() && !rc.is_empty() {
            let lrow = RowView::new(left, lc.start);
            let rrow = RowView::new(right, rc.start);

            match self.compare_keys(&lrow, &rrow)? {
                Ordering::Less => {
                    lc.next_group(left, Side::Left, self.clauses)?;
                    continue;
                }
                Ordering::Greater => {
                    rc.next_group(right, Side::Right, self.clauses)?;
                    continue;
                }
                Ordering::Equal => {}
            }

            if self.accepts(&lrow, &rrow)? {
                out.append_product(left, lc.rows(), right, rc.rows());
                stats.matched_groups += 1;
                stats.rows_emitted += (lc.rows().len() * rc.rows().len()) as u64;
            } else {
                // The whole key group goes, on both sides.
                stats.discarded_groups += 1;
            }

            lc.next_group(left, Side::Left, self.clauses)?;
            rc.next_group(right, Side::Right, self.clauses)?;
        }

        Ok(stats)
    }

    /// Clause-by-clause comparison; the first unequal clause decides.
    fn compare_keys(&self, left: &RowView<'_>, right: &RowView<'_>) -> Result<Ordering, ExprError> {
        for clause in self.clauses {
            let lv = clause.left.evaluate(left, right, None)?;
            let rv = clause.right.evaluate(left, right, None)?;
            match lv.compare(&rv) {
                Ordering::Equal => continue,
                other => return Ok(other),
            }
        }
        Ok(Ordering::Equal)
    }

    /// Residual predicate on the representative rows of a matched group pair.
    fn accepts(&self, left: &RowView<'_>, right: &RowView<'_>) -> Result<bool, ExprError> {
        match self.predicate {
            None => Ok(true),
            Some(p) => Ok(!p.evaluate(left, right, self.ctx)?.is_false()),
        }
    }
}
