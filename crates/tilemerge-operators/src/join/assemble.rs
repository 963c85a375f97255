//! Output assembly for one tile pair.
//!
//! The output tile reuses both inputs' schemas. Its position lists are the
//! left tile's lists followed by the right tile's, so every right column's
//! `position_list_idx` is shifted by the left list count.

use std::ops::Range;

use tilemerge_core::tile::{ColumnInfo, LogicalTile, PositionList};

use crate::traits::OpError;

#[derive(Debug)]
pub struct OutputAssembler {
    schema: Vec<ColumnInfo>,
    position_lists: Vec<PositionList>,
    left_lists: usize,
}

impl OutputAssembler {
    /// Combined schema plus one empty position list per input list.
    pub fn new(left: &LogicalTile, right: &LogicalTile, capacity: usize) -> Self {
        let left_lists = left.position_lists().len();
        let right_lists = right.position_lists().len();

        let mut schema = Vec::with_capacity(left.column_count() + right.column_count());
        schema.extend(left.schema().iter().cloned());
        schema.extend(right.schema().iter().map(|col| {
            let mut col = col.clone();
            col.position_list_idx += left_lists;
            col
        }));

        let position_lists = (0..left_lists + right_lists)
            .map(|_| Vec::with_capacity(capacity))
            .collect();

        Self {
            schema,
            position_lists,
            left_lists,
        }
    }

    pub fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.position_lists.first().map(|p| p.len()).unwrap_or(0)
    }

    /// Append the Cartesian product of two matched groups, left-major.
    pub fn append_product(
        &mut self,
        left: &LogicalTile,
        left_rows: Range<usize>,
        right: &LogicalTile,
        right_rows: Range<usize>,
    ) {
        let (out_left, out_right) = self.position_lists.split_at_mut(self.left_lists);
        for l in left_rows {
            for r in right_rows.clone() {
                for (out, src) in out_left.iter_mut().zip(left.position_lists()) {
                    out.push(src[l]);
                }
                for (out, src) in out_right.iter_mut().zip(right.position_lists()) {
                    out.push(src[r]);
                }
            }
        }
    }

    /// The finished tile, or `None` when nothing matched.
    pub fn finish(self) -> Result<Option<LogicalTile>, OpError> {
        if self.row_count() == 0 {
            return Ok(None);
        }
        Ok(Some(LogicalTile::new(self.schema, self.position_lists)?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tilemerge_core::types::{Column, RowBatch, Scalar};

    use super::*;

    fn tile(cols: usize, rows: usize) -> LogicalTile {
        let batch = RowBatch {
            columns: (0..cols)
                .map(|c| {
                    Column::new(
                        format!("c{c}"),
                        (0..rows).map(|r| Scalar::I64((c * 100 + r) as i64)).collect(),
                    )
                })
                .collect(),
        };
        LogicalTile::from_batch(Arc::new(batch)).unwrap()
    }

    #[test]
    fn right_columns_are_shifted() {
        let left = tile(2, 3);
        let right = tile(3, 2);
        let asm = OutputAssembler::new(&left, &right, 0);
        let idx: Vec<usize> = asm.schema().iter().map(|c| c.position_list_idx).collect();
        assert_eq!(idx, vec![0, 1, 2, 3, 4]);
        assert_eq!(asm.schema().len(), left.column_count() + right.column_count());
    }

    #[test]
    fn product_is_left_major() {
        let left = tile(1, 3);
        let right = tile(1, 3);
        let mut asm = OutputAssembler::new(&left, &right, 4);
        asm.append_product(&left, 1..3, &right, 0..2);
        assert_eq!(asm.row_count(), 4);
        let out = asm.finish().unwrap().unwrap();
        assert_eq!(out.position_lists(), &[vec![1, 1, 2, 2], vec![0, 1, 0, 1]]);
        assert_eq!(out.value(1, 3), Some(&Scalar::I64(1)));
    }

    #[test]
    fn empty_assembly_finishes_as_none() {
        let left = tile(1, 1);
        let right = tile(1, 1);
        let asm = OutputAssembler::new(&left, &right, 0);
        assert!(asm.finish().unwrap().is_none());
    }
}
