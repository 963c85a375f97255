//! Expression tree evaluated against a (left, right) pair of row views.
//!
//! Join clauses use one half per side; the residual predicate may reference
//! both. Comparisons follow SQL three-valued logic: any NULL operand yields
//! NULL, and `And`/`Or` propagate NULL the usual way.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tilemerge_core::tile::RowView;
use tilemerge_core::types::Scalar;

/// Which input of the join a column reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn holds(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CmpOp::Eq => ord == Equal,
            CmpOp::Ne => ord != Equal,
            CmpOp::Lt => ord == Less,
            CmpOp::Le => ord != Greater,
            CmpOp::Gt => ord == Greater,
            CmpOp::Ge => ord != Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Column { side: Side, index: usize },
    Literal { value: Scalar },
    /// Positional parameter bound at execution time.
    Param { index: usize },
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And { args: Vec<Expr> },
    Or { args: Vec<Expr> },
    Not { arg: Box<Expr> },
}

/// Runtime values an expression may refer to besides the two rows.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub params: Vec<Scalar>,
}

impl EvalContext {
    pub fn with_params(params: Vec<Scalar>) -> Self {
        Self { params }
    }
}

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("{side} column {index} out of range ({columns} columns)")]
    ColumnOutOfRange {
        side: Side,
        index: usize,
        columns: usize,
    },

    #[error("parameter {0} is not bound")]
    UnboundParam(usize),

    #[error("{op} expects boolean operands, got {got:?}")]
    NotBoolean { op: &'static str, got: Scalar },
}

impl Expr {
    pub fn column(side: Side, index: usize) -> Self {
        Expr::Column { side, index }
    }

    pub fn literal(value: Scalar) -> Self {
        Expr::Literal { value }
    }

    pub fn compare(op: CmpOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluate against one row from each side.
    ///
    /// Column references borrow straight from the tiles; only computed values
    /// are allocated.
    pub fn evaluate<'a>(
        &'a self,
        left: &RowView<'a>,
        right: &RowView<'a>,
        ctx: Option<&'a EvalContext>,
    ) -> Result<Cow<'a, Scalar>, ExprError> {
        match self {
            Expr::Column { side, index } => {
                let view = match side {
                    Side::Left => left,
                    Side::Right => right,
                };
                view.value(*index)
                    .map(Cow::Borrowed)
                    .ok_or(ExprError::ColumnOutOfRange {
                        side: *side,
                        index: *index,
                        columns: view.column_count(),
                    })
            }
            Expr::Literal { value } => Ok(Cow::Borrowed(value)),
            Expr::Param { index } => ctx
                .and_then(|c| c.params.get(*index))
                .map(Cow::Borrowed)
                .ok_or(ExprError::UnboundParam(*index)),
            Expr::Compare { op, left: l, right: r } => {
                let a = l.evaluate(left, right, ctx)?;
                let b = r.evaluate(left, right, ctx)?;
                if a.is_null() || b.is_null() {
                    return Ok(Cow::Owned(Scalar::Null));
                }
                Ok(Cow::Owned(Scalar::Bool(op.holds(a.compare(&b)))))
            }
            Expr::And { args } => {
                let mut saw_null = false;
                for arg in args {
                    match as_bool("and", arg.evaluate(left, right, ctx)?)? {
                        Some(false) => return Ok(Cow::Owned(Scalar::Bool(false))),
                        Some(true) => {}
                        None => saw_null = true,
                    }
                }
                Ok(Cow::Owned(if saw_null {
                    Scalar::Null
                } else {
                    Scalar::Bool(true)
                }))
            }
            Expr::Or { args } => {
                let mut saw_null = false;
                for arg in args {
                    match as_bool("or", arg.evaluate(left, right, ctx)?)? {
                        Some(true) => return Ok(Cow::Owned(Scalar::Bool(true))),
                        Some(false) => {}
                        None => saw_null = true,
                    }
                }
                Ok(Cow::Owned(if saw_null {
                    Scalar::Null
                } else {
                    Scalar::Bool(false)
                }))
            }
            Expr::Not { arg } => {
                let v = as_bool("not", arg.evaluate(left, right, ctx)?)?;
                Ok(Cow::Owned(v.map(|b| Scalar::Bool(!b)).unwrap_or(Scalar::Null)))
            }
        }
    }

    /// Index of the first parameter reference in the tree, if any.
    pub fn first_param(&self) -> Option<usize> {
        match self {
            Expr::Param { index } => Some(*index),
            Expr::Column { .. } | Expr::Literal { .. } => None,
            Expr::Compare { left, right, .. } => left.first_param().or_else(|| right.first_param()),
            Expr::And { args } | Expr::Or { args } => args.iter().find_map(Expr::first_param),
            Expr::Not { arg } => arg.first_param(),
        }
    }

    /// Call `f` for every column reference in the tree.
    pub fn for_each_column(&self, f: &mut impl FnMut(Side, usize)) {
        match self {
            Expr::Column { side, index } => f(*side, *index),
            Expr::Literal { .. } | Expr::Param { .. } => {}
            Expr::Compare { left, right, .. } => {
                left.for_each_column(f);
                right.for_each_column(f);
            }
            Expr::And { args } | Expr::Or { args } => {
                for a in args {
                    a.for_each_column(f);
                }
            }
            Expr::Not { arg } => arg.for_each_column(f),
        }
    }
}

fn as_bool(op: &'static str, v: Cow<'_, Scalar>) -> Result<Option<bool>, ExprError> {
    match v.as_ref() {
        Scalar::Bool(b) => Ok(Some(*b)),
        Scalar::Null => Ok(None),
        other => Err(ExprError::NotBoolean {
            op,
            got: other.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tilemerge_core::tile::LogicalTile;
    use tilemerge_core::types::{Column, RowBatch};

    use super::*;

    fn tile(values: Vec<Scalar>) -> LogicalTile {
        LogicalTile::from_batch(Arc::new(RowBatch {
            columns: vec![Column::new("v", values)],
        }))
        .unwrap()
    }

    #[test]
    fn compare_reads_each_side() {
        let l = tile(vec![Scalar::I32(3)]);
        let r = tile(vec![Scalar::I32(5)]);
        let e = Expr::compare(CmpOp::Lt, Expr::column(Side::Left, 0), Expr::column(Side::Right, 0));
        let v = e.evaluate(&l.row(0), &r.row(0), None).unwrap();
        assert_eq!(v.as_ref(), &Scalar::Bool(true));
    }

    #[test]
    fn null_operands_make_unknown() {
        let l = tile(vec![Scalar::Null]);
        let r = tile(vec![Scalar::I32(5)]);
        let cmp = Expr::compare(CmpOp::Eq, Expr::column(Side::Left, 0), Expr::column(Side::Right, 0));
        let v = cmp.evaluate(&l.row(0), &r.row(0), None).unwrap();
        assert!(v.is_null());

        let or = Expr::Or {
            args: vec![cmp.clone(), Expr::literal(Scalar::Bool(true))],
        };
        assert!(or.evaluate(&l.row(0), &r.row(0), None).unwrap().is_true());

        let and = Expr::And {
            args: vec![cmp, Expr::literal(Scalar::Bool(true))],
        };
        assert!(and.evaluate(&l.row(0), &r.row(0), None).unwrap().is_null());
    }

    #[test]
    fn params_come_from_context() {
        let l = tile(vec![Scalar::I32(3)]);
        let e = Expr::compare(CmpOp::Eq, Expr::column(Side::Left, 0), Expr::Param { index: 0 });
        let ctx = EvalContext::with_params(vec![Scalar::I64(3)]);
        assert!(e.evaluate(&l.row(0), &l.row(0), Some(&ctx)).unwrap().is_true());
        assert!(matches!(
            e.evaluate(&l.row(0), &l.row(0), None),
            Err(ExprError::UnboundParam(0))
        ));
    }

    #[test]
    fn out_of_range_column_is_an_error() {
        let l = tile(vec![Scalar::I32(3)]);
        let e = Expr::column(Side::Right, 4);
        assert!(matches!(
            e.evaluate(&l.row(0), &l.row(0), None),
            Err(ExprError::ColumnOutOfRange { side: Side::Right, index: 4, columns: 1 })
        ));
    }

    #[test]
    fn connectives_reject_non_booleans() {
        let l = tile(vec![Scalar::I32(3)]);
        let e = Expr::Not {
            arg: Box::new(Expr::column(Side::Left, 0)),
        };
        assert!(matches!(
            e.evaluate(&l.row(0), &l.row(0), None),
            Err(ExprError::NotBoolean { op: "not", .. })
        ));
    }
}
