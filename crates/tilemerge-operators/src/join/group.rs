//! Group boundary scanning.
//!
//! Inputs are sorted on the join keys, so a row that equals its predecessor on
//! every clause belongs to the same group. Comparing neighbours is enough.

use std::cmp::Ordering;
use std::ops::Range;

use tilemerge_core::tile::{LogicalTile, RowView};

use crate::expr::{ExprError, Side};
use crate::plan::JoinClause;

/// End of the group that starts at `start_row`: the first row whose key
/// differs from its predecessor, or the row count.
///
/// Returns `start_row` unchanged when `start_row` is past the last row.
pub fn advance(
    tile: &LogicalTile,
    start_row: usize,
    side: Side,
    clauses: &[JoinClause],
) -> Result<usize, ExprError> {
    let rows = tile.row_count();
    if start_row >= rows {
        return Ok(start_row);
    }

    let mut end = start_row + 1;
    while end < rows {
        if !same_key(tile, end - 1, end, side, clauses)? {
            break;
        }
        end += 1;
    }
    Ok(end)
}

/// Compare two rows of one tile on `side`'s half of every clause.
pub(crate) fn key_order(
    tile: &LogicalTile,
    a: usize,
    b: usize,
    side: Side,
    clauses: &[JoinClause],
) -> Result<Ordering, ExprError> {
    let ra = RowView::new(tile, a);
    let rb = RowView::new(tile, b);
    for clause in clauses {
        // Both views come from the same input, so pass each row as both sides.
        let expr = clause.side(side);
        let va = expr.evaluate(&ra, &ra, None)?;
        let vb = expr.evaluate(&rb, &rb, None)?;
        match va.compare(&vb) {
            Ordering::Equal => continue,
            other => return Ok(other),
        }
    }
    Ok(Ordering::Equal)
}

fn same_key(
    tile: &LogicalTile,
    a: usize,
    b: usize,
    side: Side,
    clauses: &[JoinClause],
) -> Result<bool, ExprError> {
    Ok(key_order(tile, a, b, side, clauses)? == Ordering::Equal)
}

/// `[start, end)` range of the current group on one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupCursor {
    pub start: usize,
    pub end: usize,
}

impl GroupCursor {
    /// Cursor positioned on the first group of `tile`.
    pub fn first(tile: &LogicalTile, side: Side, clauses: &[JoinClause]) -> Result<Self, ExprError> {
        Ok(Self {
            start: 0,
            end: advance(tile, 0, side, clauses)?,
        })
    }

    /// Move past the current group onto the next one.
    pub fn next_group(
        &mut self,
        tile: &LogicalTile,
        side: Side,
        clauses: &[JoinClause],
    ) -> Result<(), ExprError> {
        self.start = self.end;
        self.end = advance(tile, self.start, side, clauses)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tilemerge_core::types::{Column, RowBatch, Scalar};

    use super::*;

    fn tile(keys: &[i64]) -> LogicalTile {
        let batch = RowBatch {
            columns: vec![Column::new(
                "k",
                keys.iter().map(|k| Scalar::I64(*k)).collect(),
            )],
        };
        LogicalTile::from_batch(Arc::new(batch)).unwrap()
    }

    #[test]
    fn finds_group_ends() {
        let t = tile(&[1, 1, 2, 3, 3, 3]);
        let clauses = [JoinClause::on_columns(0, 0)];
        assert_eq!(advance(&t, 0, Side::Left, &clauses).unwrap(), 2);
        assert_eq!(advance(&t, 2, Side::Left, &clauses).unwrap(), 3);
        assert_eq!(advance(&t, 3, Side::Left, &clauses).unwrap(), 6);
    }

    #[test]
    fn past_the_end_is_empty() {
        let t = tile(&[1, 2]);
        let clauses = [JoinClause::on_columns(0, 0)];
        assert_eq!(advance(&t, 2, Side::Right, &clauses).unwrap(), 2);
        assert_eq!(advance(&t, 9, Side::Right, &clauses).unwrap(), 9);
        assert_eq!(advance(&tile(&[]), 0, Side::Left, &clauses).unwrap(), 0);
    }

    #[test]
    fn cursor_walks_every_group_once() {
        let t = tile(&[4, 4, 4, 5, 7, 7]);
        let clauses = [JoinClause::on_columns(0, 0)];
        let mut cur = GroupCursor::first(&t, Side::Left, &clauses).unwrap();
        let mut seen = Vec::new();
        while !cur.is_empty() {
            seen.push(cur.rows());
            cur.next_group(&t, Side::Left, &clauses).unwrap();
        }
        assert_eq!(seen, vec![0..3, 3..4, 4..6]);
    }
}
