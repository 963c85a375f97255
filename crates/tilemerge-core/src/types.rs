//! Lightweight logical values and the physical `RowBatch` they live in.
//!
//! `RowBatch` is the only place values are actually stored. Everything the
//! join touches afterwards is a `LogicalTile` pointing into one or more
//! batches by row index.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
}

impl Scalar {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(DataType::Boolean),
            Scalar::I16(_) => Some(DataType::Int16),
            Scalar::I32(_) => Some(DataType::Int32),
            Scalar::I64(_) => Some(DataType::Int64),
            Scalar::F32(_) => Some(DataType::Float32),
            Scalar::F64(_) => Some(DataType::Float64),
            Scalar::Str(_) => Some(DataType::Utf8),
            Scalar::Bin(_) => Some(DataType::Binary),
            Scalar::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// True only for `Bool(true)`.
    pub fn is_true(&self) -> bool {
        matches!(self, Scalar::Bool(true))
    }

    /// True for `Bool(false)` and for `Null`: an unknown predicate result
    /// never qualifies a row. Non-boolean values are not false.
    pub fn is_false(&self) -> bool {
        matches!(self, Scalar::Bool(false) | Scalar::Null)
    }

    /// Total order used for sorting and for join-key comparison.
    ///
    /// Nulls sort first and compare equal to each other. Integers of any width
    /// compare by value, as do floats against integers. Remaining mixed-type
    /// pairs are ordered by type.
    pub fn compare(&self, other: &Scalar) -> Ordering {
        use Scalar::*;

        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Bool(x), Bool(y)) => x.cmp(y),
            (Str(x), Str(y)) => x.cmp(y),
            (Bin(x), Bin(y)) => x.cmp(y),
            (Timestamp(x), Timestamp(y)) => x.cmp(y),
            _ => match (self.numeric(), other.numeric()) {
                (Some(Num::Int(x)), Some(Num::Int(y))) => x.cmp(&y),
                (Some(Num::Int(x)), Some(Num::Float(y))) => int_float_cmp(x, y),
                (Some(Num::Float(x)), Some(Num::Int(y))) => int_float_cmp(y, x).reverse(),
                (Some(Num::Float(x)), Some(Num::Float(y))) => float_cmp(x, y),
                _ => type_order(self).cmp(&type_order(other)),
            },
        }
    }

    fn numeric(&self) -> Option<Num> {
        match self {
            Scalar::I16(v) => Some(Num::Int(i64::from(*v))),
            Scalar::I32(v) => Some(Num::Int(i64::from(*v))),
            Scalar::I64(v) => Some(Num::Int(*v)),
            Scalar::F32(v) => Some(Num::Float(f64::from(*v))),
            Scalar::F64(v) => Some(Num::Float(*v)),
            _ => None,
        }
    }

    /// Feed a stable byte encoding of this value into `hasher`.
    pub fn hash_into(&self, hasher: &mut blake3::Hasher) {
        use Scalar::*;

        // Write type discriminant first
        hasher.update(&[type_order(self)]);

        match self {
            Null => {}
            Bool(b) => {
                hasher.update(&[*b as u8]);
            }
            I16(i) => {
                hasher.update(&i.to_le_bytes());
            }
            I32(i) => {
                hasher.update(&i.to_le_bytes());
            }
            I64(i) | Timestamp(i) => {
                hasher.update(&i.to_le_bytes());
            }
            F32(f) => {
                hasher.update(&f.to_bits().to_le_bytes());
            }
            F64(f) => {
                hasher.update(&f.to_bits().to_le_bytes());
            }
            Str(s) => {
                hasher.update(&(s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
            Bin(b) => {
                hasher.update(&(b.len() as u64).to_le_bytes());
                hasher.update(b);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

/// Exact integer/float comparison; no rounding through `as f64`.
///
/// NaN sorts after every integer, matching `float_cmp`.
fn int_float_cmp(i: i64, f: f64) -> Ordering {
    // 2^63 is exactly representable; i64::MAX is not.
    const TWO_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() || f >= TWO_63 {
        return Ordering::Less;
    }
    if f < -TWO_63 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    // In range, so the cast is exact.
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&f).unwrap_or(Ordering::Equal),
        other => other,
    }
}

/// NaN sorts after every other float and equal to itself.
fn float_cmp(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Numeric order of scalar types for mixed-type comparisons.
fn type_order(s: &Scalar) -> u8 {
    use Scalar::*;
    match s {
        Null => 0,
        Bool(_) => 1,
        I16(_) => 2,
        I32(_) => 3,
        I64(_) => 4,
        F32(_) => 5,
        F64(_) => 6,
        Str(_) => 7,
        Bin(_) => 8,
        Timestamp(_) => 9,
    }
}

/// Named column of values inside a physical batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Physical storage: the rows that logical tiles point into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
}

impl RowBatch {
    /// Build a batch, rejecting ragged columns.
    pub fn try_new(columns: Vec<Column>) -> Result<Self> {
        let batch = RowBatch { columns };
        batch.validate()?;
        Ok(batch)
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// All columns must hold the same number of values.
    pub fn validate(&self) -> Result<()> {
        let rows = self.num_rows();
        for col in &self.columns {
            if col.len() != rows {
                return Err(Error::Invariant(format!(
                    "column '{}' has {} values, expected {}",
                    col.name,
                    col.len(),
                    rows
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_compare_across_widths() {
        assert_eq!(Scalar::I16(7).compare(&Scalar::I64(7)), Ordering::Equal);
        assert_eq!(Scalar::I32(-1).compare(&Scalar::I64(0)), Ordering::Less);
        assert_eq!(Scalar::F64(2.5).compare(&Scalar::I32(2)), Ordering::Greater);
    }

    #[test]
    fn large_integers_compare_exactly_against_floats() {
        let two_53 = 1i64 << 53;
        let f = Scalar::F64(two_53 as f64);
        assert_eq!(Scalar::I64(two_53).compare(&f), Ordering::Equal);
        assert_eq!(Scalar::I64(two_53 + 1).compare(&f), Ordering::Greater);
        assert_eq!(f.compare(&Scalar::I64(two_53 + 1)), Ordering::Less);

        assert_eq!(Scalar::I64(i64::MAX).compare(&Scalar::F64(9.3e18)), Ordering::Less);
        assert_eq!(Scalar::I64(i64::MIN).compare(&Scalar::F64(-1e19)), Ordering::Greater);
        assert_eq!(Scalar::I32(-3).compare(&Scalar::F64(-2.5)), Ordering::Less);
        assert_eq!(Scalar::I32(-2).compare(&Scalar::F64(-2.5)), Ordering::Greater);
        assert_eq!(Scalar::I64(0).compare(&Scalar::F64(f64::NAN)), Ordering::Less);
    }

    #[test]
    fn nulls_sort_first_and_are_false() {
        assert_eq!(Scalar::Null.compare(&Scalar::I32(i32::MIN)), Ordering::Less);
        assert_eq!(Scalar::Null.compare(&Scalar::Null), Ordering::Equal);
        assert!(Scalar::Null.is_false());
        assert!(Scalar::Bool(false).is_false());
        assert!(!Scalar::Bool(true).is_false());
        assert!(!Scalar::I32(0).is_false());
    }

    #[test]
    fn ragged_batch_is_rejected() {
        let err = RowBatch::try_new(vec![
            Column::new("a", vec![Scalar::I32(1), Scalar::I32(2)]),
            Column::new("b", vec![Scalar::I32(1)]),
        ]);
        assert!(matches!(err, Err(Error::Invariant(_))));
    }
}
