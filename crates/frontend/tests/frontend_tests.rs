//! Integration tests for the Slate frontend.
//!
//! Whole programs go through `analyze` and the annotated tree is inspected.

use proptest::prelude::*;
use slate_common::{BaseType, VarType};
use slate_frontend::ast::{ExprKind, StmtKind};
use slate_frontend::{analyze, FrontendError, SemanticError, SyntaxError};

// ============================================================
// Helpers
// ============================================================

fn semantic_error(source: &str) -> SemanticError {
    match analyze(source) {
        Err(FrontendError::Semantic(e)) => e,
        other => panic!("expected semantic error, got {other:?}"),
    }
}

fn syntax_error(source: &str) -> SyntaxError {
    match analyze(source) {
        Err(FrontendError::Syntax(e)) => e,
        other => panic!("expected syntax error, got {other:?}"),
    }
}

// ============================================================
// Accepted programs
// ============================================================

#[test]
fn counting_loop() {
    let program = analyze(
        "// count to three
int x = 0;
while (x < 3) {
    x = x + 1;
}
x;",
    )
    .unwrap();
    assert_eq!(program.statements.len(), 3);
    assert_eq!(program.slot_types, vec![VarType::INT]);
    assert!(program.has_result());
}

#[test]
fn matrix_program() {
    let program = analyze(
        "int[][] m = [[1, 2], [3, 4]];
m[1][0] = m[0][1] * 10;
m[1][0];",
    )
    .unwrap();
    assert_eq!(program.slot_types, vec![VarType::new(BaseType::Int, 1)]);
    match &program.statements[2].kind {
        StmtKind::Expr(e) => assert_eq!(e.ty, Some(VarType::INT)),
        other => panic!("expected expression, got {other:?}"),
    }
}

#[test]
fn string_program() {
    let program = analyze(
        "string greeting = \"hello\";
string name = \"slate\";
greeting + \", \" + name;",
    )
    .unwrap();
    assert_eq!(program.locals_count(), 2);
}

#[test]
fn nested_scopes_allocate_distinct_slots() {
    let program = analyze(
        "int total = 0;
int i = 0;
while (i < 4) {
    int sq = i * i;
    if (sq % 2 == 0) {
        int half = sq / 2;
        total += half;
    } else {
        int odd = sq;
        total += odd;
    }
    i += 1;
}
total;",
    )
    .unwrap();
    assert_eq!(program.locals_count(), 5);
}

#[test]
fn short_circuit_operands_are_typed_bool() {
    let program = analyze("false && (1 / 0 == 0);").unwrap();
    match &program.statements[0].kind {
        StmtKind::Expr(e) => {
            assert_eq!(e.ty, Some(VarType::BOOL));
            assert!(matches!(e.kind, ExprKind::Binary { .. }));
        }
        other => panic!("expected expression, got {other:?}"),
    }
}

#[test]
fn variables_carry_slots_and_types() {
    let program = analyze("bool f = true; string s = \"x\"; s;").unwrap();
    match &program.statements[2].kind {
        StmtKind::Expr(e) => {
            assert_eq!(
                e.kind,
                ExprKind::Var {
                    name: "s".to_string(),
                    slot: Some(1)
                }
            );
            assert_eq!(e.ty, Some(VarType::STRING));
        }
        other => panic!("expected expression, got {other:?}"),
    }
}

// ============================================================
// Rejected programs
// ============================================================

#[test]
fn missing_closing_brace_is_fatal() {
    assert!(matches!(
        syntax_error("int x = 0; while (x < 3) { x = x + 1;"),
        SyntaxError::UnexpectedEof { expected: "'}'", .. }
    ));
}

#[test]
fn missing_condition_parens() {
    assert!(matches!(
        syntax_error("if true { }"),
        SyntaxError::UnexpectedToken { expected: "'('", .. }
    ));
}

#[test]
fn shadowing_in_nested_block() {
    assert!(matches!(
        semantic_error("int a = 0; { { int a = 1; } }"),
        SemanticError::Redeclared { .. }
    ));
}

#[test]
fn assignment_to_wrong_type() {
    assert!(matches!(
        semantic_error("bool b = true; b = 3;"),
        SemanticError::TypeMismatch { .. }
    ));
}

#[test]
fn ten_thousand_nested_parentheses_are_a_syntax_error() {
    let source = format!("int x = {}1{};", "(".repeat(10_000), ")".repeat(10_000));
    assert!(matches!(
        syntax_error(&source),
        SyntaxError::NestingTooDeep { line: 1, .. }
    ));
}

#[test]
fn ten_thousand_nested_blocks_are_a_syntax_error() {
    let source = format!("int x = 0;\n{}{}", "{".repeat(10_000), "}".repeat(10_000));
    assert!(matches!(
        syntax_error(&source),
        SyntaxError::NestingTooDeep { line: 2, .. }
    ));
}

#[test]
fn nested_arrays_within_the_limit_type_check() {
    let depth = 50;
    let source = format!(
        "int{} a = {}1{};",
        "[]".repeat(depth),
        "[".repeat(depth),
        "]".repeat(depth)
    );
    let program = analyze(&source).unwrap();
    assert_eq!(
        program.slot_types,
        vec![VarType::new(BaseType::Int, depth as i16 - 1)]
    );
}

#[test]
fn error_lines_point_at_the_fault() {
    let err = analyze("int a = 1;\nint b = 2;\nbool c = a;").unwrap_err();
    assert_eq!(err.line(), 3);
}

// ============================================================
// Properties
// ============================================================

proptest! {
    /// Arbitrary text never panics the frontend.
    #[test]
    fn arbitrary_source_never_panics(source in "[ -~\\n]{0,80}") {
        let _ = analyze(&source);
    }

    /// Any i32 literal written in decimal round-trips through the lexer.
    #[test]
    fn integer_literals_round_trip(n in 0..=i32::MAX) {
        let program = analyze(&format!("{n};")).unwrap();
        match &program.statements[0].kind {
            StmtKind::Expr(e) => prop_assert_eq!(&e.kind, &ExprKind::Int(n)),
            other => prop_assert!(false, "expected expression, got {:?}", other),
        }
    }

    /// Every declaration gets its own slot.
    #[test]
    fn locals_count_matches_declarations(count in 0usize..40) {
        let source: String = (0..count).map(|i| format!("int v{i} = {i};\n")).collect();
        let program = analyze(&source).unwrap();
        prop_assert_eq!(program.locals_count(), count);
    }
}
