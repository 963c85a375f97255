//! Bridge between engine scalars and an external database's native datums.
//!
//! External datums are either a machine word (fixed-width integers, floats,
//! timestamps) or a varlena: a buffer whose first 4 bytes hold the total size,
//! header included, followed by the payload. Payloads are copied by that
//! length; they are never assumed to be NUL-terminated.
//!
//! Conversions never fail: an unknown type tag or a datum of the wrong shape
//! is logged and becomes `Scalar::Null` / `Datum::Null`.

use tilemerge_core::tile::LogicalTile;
use tilemerge_core::types::{Column, RowBatch, Scalar};

use crate::traits::OpError;

/// External type tags (catalog type ids of the host database).
pub mod type_tag {
    pub const BIGINT: u32 = 20;
    pub const SMALLINT: u32 = 21;
    pub const INTEGER: u32 = 23;
    pub const TEXT: u32 = 25;
    pub const FLOAT8: u32 = 701;
    pub const BPCHAR: u32 = 1042;
    pub const VARCHAR: u32 = 1043;
    pub const TIMESTAMP: u32 = 1114;
}

/// Size of the varlena length header.
pub const VARHDRSZ: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datum {
    Word(u64),
    Varlena(Vec<u8>),
    Null,
}

impl Datum {
    /// Build a varlena holding `payload`.
    pub fn varlena(payload: &[u8]) -> Self {
        let total = (payload.len() + VARHDRSZ) as u32;
        let mut buf = Vec::with_capacity(payload.len() + VARHDRSZ);
        buf.extend_from_slice(&total.to_le_bytes());
        buf.extend_from_slice(payload);
        Datum::Varlena(buf)
    }
}

/// Convert an external datum of type `tag` into an engine scalar.
pub fn to_internal_value(datum: &Datum, tag: u32) -> Scalar {
    use type_tag::*;

    match (tag, datum) {
        (_, Datum::Null) => Scalar::Null,
        (SMALLINT, Datum::Word(w)) => Scalar::I16(*w as i16),
        (INTEGER, Datum::Word(w)) => Scalar::I32(*w as i32),
        (BIGINT, Datum::Word(w)) => Scalar::I64(*w as i64),
        (FLOAT8, Datum::Word(w)) => Scalar::F64(f64::from_bits(*w)),
        (TIMESTAMP, Datum::Word(w)) => Scalar::Timestamp(*w as i64),
        (BPCHAR | VARCHAR | TEXT, Datum::Varlena(buf)) => match varlena_payload(buf) {
            // Bytes are copied exactly; non-UTF-8 payloads stay binary.
            Some(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(s) => Scalar::Str(s),
                Err(e) => Scalar::Bin(e.into_bytes()),
            },
            None => {
                unrecognized("malformed varlena", tag);
                Scalar::Null
            }
        },
        (SMALLINT | INTEGER | BIGINT | FLOAT8 | TIMESTAMP | BPCHAR | VARCHAR | TEXT, _) => {
            unrecognized("datum shape does not match type", tag);
            Scalar::Null
        }
        _ => {
            unrecognized("unknown type tag", tag);
            Scalar::Null
        }
    }
}

/// Convert an engine scalar into an external datum.
pub fn to_external_datum(value: &Scalar) -> Datum {
    match value {
        Scalar::Null => Datum::Null,
        Scalar::I16(v) => Datum::Word(i64::from(*v) as u64),
        Scalar::I32(v) => Datum::Word(i64::from(*v) as u64),
        Scalar::I64(v) | Scalar::Timestamp(v) => Datum::Word(*v as u64),
        Scalar::F64(v) => Datum::Word(v.to_bits()),
        Scalar::Str(s) => Datum::varlena(s.as_bytes()),
        Scalar::Bin(b) => Datum::varlena(b),
        Scalar::Bool(_) | Scalar::F32(_) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(value = ?value, "no external datum for value type");
            Datum::Null
        }
    }
}

/// Build a physical batch from external rows, one type tag per column.
pub fn batch_from_external(
    names: &[&str],
    tags: &[u32],
    rows: &[Vec<Datum>],
) -> Result<RowBatch, OpError> {
    if names.len() != tags.len() {
        return Err(OpError::Schema(format!(
            "{} column names for {} type tags",
            names.len(),
            tags.len()
        )));
    }
    let mut columns: Vec<Column> = names
        .iter()
        .map(|n| Column::new(*n, Vec::with_capacity(rows.len())))
        .collect();
    for (i, row) in rows.iter().enumerate() {
        if row.len() != tags.len() {
            return Err(OpError::Schema(format!(
                "external row {} has {} attributes, expected {}",
                i,
                row.len(),
                tags.len()
            )));
        }
        for ((col, datum), tag) in columns.iter_mut().zip(row).zip(tags) {
            col.values.push(to_internal_value(datum, *tag));
        }
    }
    Ok(RowBatch { columns })
}

/// One output row of a tile as external datums, in column order.
pub fn row_to_external(tile: &LogicalTile, row: usize) -> Option<Vec<Datum>> {
    (0..tile.column_count())
        .map(|c| tile.value(c, row).map(to_external_datum))
        .collect()
}

fn varlena_payload(buf: &[u8]) -> Option<&[u8]> {
    let header: [u8; VARHDRSZ] = buf.get(..VARHDRSZ)?.try_into().ok()?;
    let total = u32::from_le_bytes(header) as usize;
    let len = total.checked_sub(VARHDRSZ)?;
    buf.get(VARHDRSZ..VARHDRSZ + len)
}

fn unrecognized(_reason: &str, _tag: u32) {
    #[cfg(feature = "tracing")]
    tracing::warn!(type_tag = _tag, reason = _reason, "external datum converted to null");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_values_convert() {
        assert_eq!(
            to_internal_value(&to_external_datum(&Scalar::I16(-3)), type_tag::SMALLINT),
            Scalar::I16(-3)
        );
        assert_eq!(
            to_internal_value(&Datum::Word(42), type_tag::INTEGER),
            Scalar::I32(42)
        );
        assert_eq!(
            to_internal_value(&to_external_datum(&Scalar::Timestamp(1_700_000_000_000_000)), type_tag::TIMESTAMP),
            Scalar::Timestamp(1_700_000_000_000_000)
        );
    }

    #[test]
    fn varlena_is_copied_by_length() {
        // Header says 4 + 3 bytes; the trailing bytes are not part of the value.
        let mut buf = 7u32.to_le_bytes().to_vec();
        buf.extend_from_slice(b"abcXYZ");
        assert_eq!(
            to_internal_value(&Datum::Varlena(buf), type_tag::VARCHAR),
            Scalar::Str("abc".into())
        );
        assert_eq!(
            to_internal_value(&Datum::varlena(b"a\0b"), type_tag::TEXT),
            Scalar::Str("a\0b".into())
        );

        let raw = Datum::varlena(&[0xff, 0xfe, b'a']);
        let value = to_internal_value(&raw, type_tag::BPCHAR);
        assert_eq!(value, Scalar::Bin(vec![0xff, 0xfe, b'a']));
        assert_eq!(to_external_datum(&value), Datum::Varlena(vec![7, 0, 0, 0, 0xff, 0xfe, b'a']));
    }

    #[test]
    fn bad_input_degrades_to_null() {
        assert_eq!(to_internal_value(&Datum::Word(1), 9999), Scalar::Null);
        assert_eq!(to_internal_value(&Datum::Word(1), type_tag::TEXT), Scalar::Null);
        assert_eq!(to_internal_value(&Datum::Varlena(vec![200, 0, 0, 0, b'x']), type_tag::TEXT), Scalar::Null);
        assert_eq!(to_external_datum(&Scalar::Bool(true)), Datum::Null);
    }
}
