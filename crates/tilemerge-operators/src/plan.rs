//! Merge-join plan: ordered join clauses plus an optional residual predicate.
//!
//! Plans usually arrive as YAML or JSON:
//! ```yaml
//! clauses:
//!   - left:  { kind: column, side: left,  index: 0 }
//!     right: { kind: column, side: right, index: 1 }
//! predicate:
//!   kind: compare
//!   op: lt
//!   left:  { kind: column, side: left,  index: 1 }
//!   right: { kind: column, side: right, index: 0 }
//! ```
//! Clause order is kept exactly as written; it decides the merge direction.

use serde::{Deserialize, Serialize};

use tilemerge_core::schema::Schema;

use crate::expr::{Expr, Side};
use crate::traits::OpError;

/// One join-key dimension: `left` is evaluated on left rows, `right` on right rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    pub left: Expr,
    pub right: Expr,
}

impl JoinClause {
    pub fn new(left: Expr, right: Expr) -> Self {
        Self { left, right }
    }

    /// Equi-join on a single column from each side.
    pub fn on_columns(left_index: usize, right_index: usize) -> Self {
        Self::new(
            Expr::column(Side::Left, left_index),
            Expr::column(Side::Right, right_index),
        )
    }

    /// The half of the clause that reads `side`'s rows.
    pub fn side(&self, side: Side) -> &Expr {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeJoinPlan {
    pub clauses: Vec<JoinClause>,
    #[serde(default)]
    pub predicate: Option<Expr>,
}

impl MergeJoinPlan {
    pub fn new(clauses: Vec<JoinClause>) -> Self {
        Self {
            clauses,
            predicate: None,
        }
    }

    pub fn with_predicate(mut self, predicate: Expr) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn from_yaml(src: &str) -> Result<Self, OpError> {
        let plan: Self = serde_yaml::from_str(src)
            .map_err(|e| OpError::Plan(format!("invalid merge join yaml: {e}")))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn from_json(src: &str) -> Result<Self, OpError> {
        let plan: Self = serde_json::from_str(src)
            .map_err(|e| OpError::Plan(format!("invalid merge join json: {e}")))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Each clause half may only read its own side and never a parameter (join
    /// keys are evaluated without a context); at least one clause is required.
    pub fn validate(&self) -> Result<(), OpError> {
        if self.clauses.is_empty() {
            return Err(OpError::Plan("merge join needs at least one join clause".into()));
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            for side in [Side::Left, Side::Right] {
                let mut foreign = None;
                clause.side(side).for_each_column(&mut |s, idx| {
                    if s != side && foreign.is_none() {
                        foreign = Some(idx);
                    }
                });
                if let Some(idx) = foreign {
                    return Err(OpError::Plan(format!(
                        "clause {i}: {side} expression reads column {idx} of the other input"
                    )));
                }
                if let Some(idx) = clause.side(side).first_param() {
                    return Err(OpError::Plan(format!(
                        "clause {i}: {side} expression reads parameter {idx}; join keys take no parameters"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Output schema for the given `[left, right]` input schemas.
    ///
    /// Also checks that every column reference in the plan exists.
    pub fn output_schema(&self, input_schemas: &[Schema]) -> Result<Schema, OpError> {
        let [left, right] = input_schemas else {
            return Err(OpError::Plan("merge join expects two inputs".into()));
        };

        let mut missing = None;
        let mut check = |side: Side, idx: usize| {
            let width = match side {
                Side::Left => left.len(),
                Side::Right => right.len(),
            };
            if idx >= width && missing.is_none() {
                missing = Some((side, idx, width));
            }
        };
        for clause in &self.clauses {
            clause.left.for_each_column(&mut check);
            clause.right.for_each_column(&mut check);
        }
        if let Some(p) = &self.predicate {
            p.for_each_column(&mut check);
        }
        if let Some((side, idx, width)) = missing {
            return Err(OpError::Plan(format!(
                "{side} column {idx} out of range ({width} columns)"
            )));
        }

        Ok(Schema::join(left, right))
    }
}
