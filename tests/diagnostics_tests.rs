// Error reporting through the public compile entry point

use pascal2c::semantic::SemanticErrorKind;
use pascal2c::{compile, CompileError, CompileOptions, Diagnostic};
use rstest::rstest;

fn diagnostics(source: &str) -> Vec<Diagnostic> {
    match compile(source, &CompileOptions::default()) {
        Err(CompileError::Diagnostics(diagnostics)) => diagnostics,
        other => panic!("expected diagnostics, got {:?}", other),
    }
}

fn positions(diagnostics: &[Diagnostic]) -> Vec<(usize, usize)> {
    diagnostics
        .iter()
        .map(|d| (d.location().line, d.location().column))
        .collect()
}

fn semantic_kinds(diagnostics: &[Diagnostic]) -> Vec<SemanticErrorKind> {
    diagnostics
        .iter()
        .map(|d| match d {
            Diagnostic::Semantic(err) => err.kind(),
            Diagnostic::Syntax(err) => panic!("unexpected syntax error {:?}", err),
        })
        .collect()
}

#[test]
fn test_syntax_errors_are_all_reported() {
    let source = "\
program p;
var x: integer;
begin
  x := ;
  x := 1;
  x = 2;
  x := 3
end.
";
    let found = diagnostics(source);
    assert_eq!(positions(&found), vec![(4, 8), (6, 5)]);
    assert!(found.iter().all(|d| d.kind() == "syntax"));
}

#[test]
fn test_semantic_errors_in_source_order() {
    let source = "\
program bad;
var x: integer;
    b: boolean;
procedure p(a: integer);
begin
  y := a
end;
begin
  x := b;
  p(1, 2);
  x(1);
  q
end.
";
    let found = diagnostics(source);
    assert_eq!(
        semantic_kinds(&found),
        vec![
            SemanticErrorKind::NotFound,
            SemanticErrorKind::TypeMismatch,
            SemanticErrorKind::ParameterMismatch,
            SemanticErrorKind::NotAFunction,
            SemanticErrorKind::NotFound,
        ]
    );
    assert_eq!(
        positions(&found),
        vec![(6, 3), (9, 3), (10, 3), (11, 3), (12, 3)]
    );
}

#[rstest]
#[case::duplicate(
    "program p; var x: integer; x: real; begin end.",
    SemanticErrorKind::DuplicateDeclaration
)]
#[case::undeclared("program p; begin z := 1 end.", SemanticErrorKind::NotFound)]
#[case::wrong_arity(
    "program p; procedure q(a: integer); begin end; begin q end.",
    SemanticErrorKind::ParameterMismatch
)]
#[case::var_needs_variable(
    "program p; procedure q(var a: integer); begin end; begin q(3) end.",
    SemanticErrorKind::ParameterMismatch
)]
#[case::call_a_variable(
    "program p; var v: integer; begin v(1) end.",
    SemanticErrorKind::NotAFunction
)]
#[case::real_into_integer(
    "program p; var i: integer; begin i := 1.5 end.",
    SemanticErrorKind::TypeMismatch
)]
#[case::integer_condition(
    "program p; var i: integer; begin while i do i := 0 end.",
    SemanticErrorKind::TypeMismatch
)]
#[case::write_an_array(
    "program p; var a: array[1..3] of integer; begin writeln(a) end.",
    SemanticErrorKind::TypeMismatch
)]
#[case::string_comparison(
    "program p; const s = 'hi'; var b: boolean; begin b := s = 'hi' end.",
    SemanticErrorKind::TypeMismatch
)]
#[case::non_ascii_char(
    "program p; var c: char; begin c := 'é' end.",
    SemanticErrorKind::TypeMismatch
)]
fn test_single_semantic_error(#[case] source: &str, #[case] kind: SemanticErrorKind) {
    assert_eq!(semantic_kinds(&diagnostics(source)), vec![kind]);
}

#[test]
fn test_errors_do_not_cascade() {
    // one unknown name inside a larger expression is one error
    let found = diagnostics("program p; var i: integer; begin i := (u + 1) * 2 - i end.");
    assert_eq!(semantic_kinds(&found), vec![SemanticErrorKind::NotFound]);
}

#[test]
fn test_render_points_at_the_column() {
    let source = "program p;\nvar i: integer;\nbegin\n  i := true\nend.\n";
    let found = diagnostics(source);
    assert_eq!(found.len(), 1);
    let rendered = found[0].render("bad.pas", source, false);
    assert!(rendered.starts_with("bad.pas:4:3: type error: "), "{}", rendered);
    assert!(rendered.ends_with("\n      i := true\n      ^\n"), "{}", rendered);
}

#[test]
fn test_lexical_error_stops_compilation() {
    let err = compile("program p; begin @ end.", &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Lexical(_)), "{:?}", err);
}

#[test]
fn test_oversized_array_is_a_syntax_error() {
    let found = diagnostics(
        "program p;\nvar a: array[0..9223372036854775807] of integer;\nbegin end.\n",
    );
    assert_eq!(positions(&found), vec![(2, 14)]);
    assert_eq!(found[0].kind(), "syntax");
}
