//! Join plan parsing/validation and engine configuration.

use tilemerge_core::config::EngineConfig;
use tilemerge_core::schema::{DataType, Field, Schema};
use tilemerge_core::types::Scalar;
use tilemerge_operators::{CmpOp, Expr, JoinClause, MergeJoinPlan, OpError, Side};

const PLAN_YAML: &str = r#"
clauses:
  - left:  { kind: column, side: left,  index: 1 }
    right: { kind: column, side: right, index: 0 }
  - left:  { kind: column, side: left,  index: 0 }
    right: { kind: column, side: right, index: 2 }
predicate:
  kind: compare
  op: ne
  left:  { kind: column, side: left, index: 2 }
  right: { kind: literal, value: { Str: "void" } }
"#;

#[test]
fn test_yaml_plan_keeps_clause_order() {
    let plan = MergeJoinPlan::from_yaml(PLAN_YAML).expect("parse");
    assert_eq!(
        plan.clauses,
        vec![JoinClause::on_columns(1, 0), JoinClause::on_columns(0, 2)]
    );
    assert_eq!(
        plan.predicate,
        Some(Expr::compare(
            CmpOp::Ne,
            Expr::column(Side::Left, 2),
            Expr::literal(Scalar::Str("void".into())),
        ))
    );
}

#[test]
fn test_json_plan_roundtrip() {
    let plan = MergeJoinPlan::new(vec![JoinClause::on_columns(0, 0)]).with_predicate(Expr::Not {
        arg: Box::new(Expr::Param { index: 0 }),
    });
    let json = serde_json::to_string(&plan).expect("serialize");
    assert_eq!(MergeJoinPlan::from_json(&json).expect("parse"), plan);
}

#[test]
fn test_plan_validation_errors() {
    let no_clauses = "clauses: []\n";
    assert!(matches!(MergeJoinPlan::from_yaml(no_clauses), Err(OpError::Plan(_))));

    let crossed = r#"
clauses:
  - left:  { kind: column, side: right, index: 0 }
    right: { kind: column, side: right, index: 0 }
"#;
    let err = MergeJoinPlan::from_yaml(crossed).unwrap_err();
    assert!(err.to_string().contains("clause 0"), "{err}");

    assert!(matches!(
        MergeJoinPlan::from_yaml("clauses: 7"),
        Err(OpError::Plan(_))
    ));
}

#[test]
fn test_clause_with_parameter_rejected() {
    let plan = MergeJoinPlan::new(vec![
        JoinClause::on_columns(0, 0),
        JoinClause::new(Expr::Param { index: 0 }, Expr::column(Side::Right, 0)),
    ]);
    let err = plan.validate().unwrap_err();
    assert!(matches!(err, OpError::Plan(_)));
    assert!(err.to_string().contains("clause 1"), "{err}");

    let yaml = r#"
clauses:
  - left:  { kind: column, side: left, index: 0 }
    right:
      kind: compare
      op: eq
      left:  { kind: column, side: right, index: 0 }
      right: { kind: param, index: 2 }
"#;
    assert!(matches!(MergeJoinPlan::from_yaml(yaml), Err(OpError::Plan(_))));

    // Parameters remain allowed in the residual predicate.
    let ok = MergeJoinPlan::new(vec![JoinClause::on_columns(0, 0)]).with_predicate(Expr::compare(
        CmpOp::Lt,
        Expr::column(Side::Left, 0),
        Expr::Param { index: 0 },
    ));
    assert!(ok.validate().is_ok());
}

fn schema(names: &[&str]) -> Schema {
    Schema::new(
        names
            .iter()
            .map(|n| Field::new(*n, DataType::Int64, false))
            .collect(),
    )
}

#[test]
fn test_output_schema_concatenates_and_checks_columns() {
    let plan = MergeJoinPlan::new(vec![JoinClause::on_columns(0, 1)]);
    let out = plan
        .output_schema(&[schema(&["id", "v"]), schema(&["w", "id"])])
        .expect("schema");
    let names: Vec<&str> = out.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "v", "w", "id_right"]);

    let out = plan
        .output_schema(&[schema(&["id", "id_right"]), schema(&["w", "id"])])
        .expect("schema");
    let names: Vec<&str> = out.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "id_right", "w", "id_right_right"]);

    assert!(plan.output_schema(&[schema(&["id"])]).is_err());
    assert!(plan
        .output_schema(&[schema(&["id"]), schema(&["id"])])
        .is_err());
}

#[test]
fn test_config_defaults_and_serde() {
    let cfg = EngineConfig::default();
    assert!(cfg.strict_right_exhaustion);
    assert!(!cfg.verify_sorted_inputs);

    let partial: EngineConfig =
        serde_json::from_str(r#"{ "verify_sorted_inputs": true }"#).expect("parse");
    assert!(partial.verify_sorted_inputs);
    assert!(partial.strict_right_exhaustion);
    assert_eq!(partial.position_list_capacity, cfg.position_list_capacity);
}

#[test]
fn test_config_from_env() {
    std::env::set_var("TILEMERGE_STRICT_RIGHT_EXHAUSTION", "false");
    std::env::set_var("TILEMERGE_POSITION_LIST_CAPACITY", "not-a-number");
    let cfg = EngineConfig::from_env();
    std::env::remove_var("TILEMERGE_STRICT_RIGHT_EXHAUSTION");
    std::env::remove_var("TILEMERGE_POSITION_LIST_CAPACITY");

    assert!(!cfg.strict_right_exhaustion);
    // Unparseable values fall back to the default.
    assert_eq!(
        cfg.position_list_capacity,
        EngineConfig::default().position_list_capacity
    );
}
