//! Logical tiles: position-list views over physical `RowBatch`es.
//!
//! A tile never copies values. Each output column names a physical batch, a
//! column in it, and which of the tile's position lists selects its rows.
//! Tiles are move-only; the physical batches behind them are shared read-only.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{RowBatch, Scalar};

/// Ordered row indices into a physical batch.
pub type PositionList = Vec<usize>;

/// Where one logical column gets its values from.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Physical batch holding the values.
    pub base: Arc<RowBatch>,
    /// Column index inside `base`.
    pub origin_column: usize,
    /// Which position list of the owning tile selects the rows.
    pub position_list_idx: usize,
}

impl ColumnInfo {
    pub fn new(base: Arc<RowBatch>, origin_column: usize, position_list_idx: usize) -> Self {
        Self {
            base,
            origin_column,
            position_list_idx,
        }
    }

    pub fn name(&self) -> &str {
        self.base
            .columns
            .get(self.origin_column)
            .map(|c| c.name.as_str())
            .unwrap_or("")
    }
}

/// Columnar view addressed by position lists.
///
/// Invariants (checked by `new`):
/// - every position list has the same length, which is the row count;
/// - every column's `position_list_idx` names an existing list;
/// - every position referenced by a column is a valid row of its base batch.
#[derive(Debug)]
pub struct LogicalTile {
    schema: Vec<ColumnInfo>,
    position_lists: Vec<PositionList>,
}

impl LogicalTile {
    pub fn new(schema: Vec<ColumnInfo>, position_lists: Vec<PositionList>) -> Result<Self> {
        let tile = Self {
            schema,
            position_lists,
        };
        tile.validate()?;
        Ok(tile)
    }

    /// Wrap a whole physical batch, one identity position list per column.
    pub fn from_batch(batch: Arc<RowBatch>) -> Result<Self> {
        batch.validate()?;
        let rows = batch.num_rows();
        let cols = batch.num_columns();
        let schema = (0..cols)
            .map(|c| ColumnInfo::new(Arc::clone(&batch), c, c))
            .collect();
        let position_lists = (0..cols).map(|_| (0..rows).collect()).collect();
        Self::new(schema, position_lists)
    }

    pub fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }

    pub fn position_lists(&self) -> &[PositionList] {
        &self.position_lists
    }

    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    pub fn row_count(&self) -> usize {
        self.position_lists.first().map(|p| p.len()).unwrap_or(0)
    }

    /// Zero-copy view of one row.
    pub fn row(&self, row: usize) -> RowView<'_> {
        RowView::new(self, row)
    }

    /// Resolve the value at (`column`, `row`) through the position lists.
    pub fn value(&self, column: usize, row: usize) -> Option<&Scalar> {
        let info = self.schema.get(column)?;
        let pos = *self.position_lists.get(info.position_list_idx)?.get(row)?;
        info.base.columns.get(info.origin_column)?.values.get(pos)
    }

    /// Re-check the structural invariants.
    pub fn validate(&self) -> Result<()> {
        let rows = self.row_count();
        for (i, list) in self.position_lists.iter().enumerate() {
            if list.len() != rows {
                return Err(Error::Invariant(format!(
                    "position list {} has {} rows, expected {}",
                    i,
                    list.len(),
                    rows
                )));
            }
        }

        for (c, info) in self.schema.iter().enumerate() {
            let list = self.position_lists.get(info.position_list_idx).ok_or_else(|| {
                Error::Invariant(format!(
                    "column {} references position list {} of {}",
                    c,
                    info.position_list_idx,
                    self.position_lists.len()
                ))
            })?;
            if info.origin_column >= info.base.num_columns() {
                return Err(Error::Invariant(format!(
                    "column {} references base column {} of {}",
                    c,
                    info.origin_column,
                    info.base.num_columns()
                )));
            }
            let base_rows = info.base.num_rows();
            if let Some(bad) = list.iter().find(|&&p| p >= base_rows) {
                return Err(Error::Invariant(format!(
                    "column {} points at row {} of a {}-row batch",
                    c, bad, base_rows
                )));
            }
        }
        Ok(())
    }

    /// Copy the visible values out into a fresh physical batch.
    pub fn materialize(&self) -> RowBatch {
        let rows = self.row_count();
        let columns = (0..self.column_count())
            .map(|c| crate::types::Column {
                name: self.schema[c].name().to_string(),
                values: (0..rows)
                    .map(|r| self.value(c, r).cloned().unwrap_or(Scalar::Null))
                    .collect(),
            })
            .collect();
        RowBatch { columns }
    }
}

/// One row of a tile, evaluated in place (a "container tuple").
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    tile: &'a LogicalTile,
    row: usize,
}

impl<'a> RowView<'a> {
    pub fn new(tile: &'a LogicalTile, row: usize) -> Self {
        Self { tile, row }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column_count(&self) -> usize {
        self.tile.column_count()
    }

    pub fn value(&self, column: usize) -> Option<&'a Scalar> {
        self.tile.value(column, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    fn batch() -> Arc<RowBatch> {
        Arc::new(RowBatch {
            columns: vec![
                Column::new("k", vec![Scalar::I32(1), Scalar::I32(2), Scalar::I32(3)]),
                Column::new("v", vec![Scalar::Str("a".into()), Scalar::Str("b".into()), Scalar::Str("c".into())]),
            ],
        })
    }

    #[test]
    fn from_batch_builds_identity_lists() {
        let tile = LogicalTile::from_batch(batch()).unwrap();
        assert_eq!(tile.column_count(), 2);
        assert_eq!(tile.row_count(), 3);
        assert_eq!(tile.position_lists(), &[vec![0, 1, 2], vec![0, 1, 2]]);
        assert_eq!(tile.row(1).value(1), Some(&Scalar::Str("b".into())));
    }

    #[test]
    fn values_resolve_through_position_lists() {
        let b = batch();
        let tile = LogicalTile::new(
            vec![ColumnInfo::new(Arc::clone(&b), 0, 0), ColumnInfo::new(b, 1, 0)],
            vec![vec![2, 0]],
        )
        .unwrap();
        assert_eq!(tile.value(0, 0), Some(&Scalar::I32(3)));
        assert_eq!(tile.value(1, 1), Some(&Scalar::Str("a".into())));
        assert_eq!(tile.value(0, 2), None);
    }

    #[test]
    fn unequal_position_lists_are_rejected() {
        let b = batch();
        let err = LogicalTile::new(
            vec![ColumnInfo::new(Arc::clone(&b), 0, 0), ColumnInfo::new(b, 1, 1)],
            vec![vec![0, 1], vec![0]],
        );
        assert!(matches!(err, Err(Error::Invariant(_))));
    }

    #[test]
    fn dangling_references_are_rejected() {
        let b = batch();
        assert!(LogicalTile::new(vec![ColumnInfo::new(Arc::clone(&b), 0, 1)], vec![vec![0]]).is_err());
        assert!(LogicalTile::new(vec![ColumnInfo::new(Arc::clone(&b), 5, 0)], vec![vec![0]]).is_err());
        assert!(LogicalTile::new(vec![ColumnInfo::new(b, 0, 0)], vec![vec![3]]).is_err());
    }
}
