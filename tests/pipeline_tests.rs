// End-to-end tests: Pascal source in, C text out

use pascal2c::{compile, CompileOptions};
use rstest::rstest;

fn compile_ok(source: &str) -> String {
    compile(source, &CompileOptions::default()).expect("compilation should succeed")
}

fn compile_folded(source: &str) -> String {
    compile(source, &CompileOptions::new(1)).expect("compilation should succeed")
}

#[test]
fn test_simple_program() {
    let source = r#"
program Simple;
var x, y: integer;
begin
  x := 2 + 3;
  y := x - 1
end.
"#;
    assert_eq!(
        compile_ok(source),
        "#include <stdio.h>\n\nint main() {\n    int x;\n    int y;\n    x = (2 + 3);\n    y = (x - 1);\n    return 0;\n}\n"
    );
}

#[test]
fn test_var_parameters_become_pointers() {
    let source = r#"
program refs;
var a, b: integer;
procedure swap(var x, y: integer);
var t: integer;
begin
  t := x;
  x := y;
  y := t
end;
begin
  a := 1;
  b := 2;
  swap(a, b)
end.
"#;
    let expected = "\
#include <stdio.h>

int a;
int b;

void swap(int *x, int *y);

void swap(int *x, int *y) {
    int t;
    t = *x;
    *x = *y;
    *y = t;
}

int main() {
    a = 1;
    b = 2;
    swap(&a, &b);
    return 0;
}
";
    assert_eq!(compile_ok(source), expected);
}

#[test]
fn test_recursive_function() {
    let source = r#"
program fact;
var n: integer;
function factorial(k: integer): integer;
begin
  if k <= 1 then factorial := 1
  else factorial := k * factorial(k - 1)
end;
begin
  n := factorial(5);
  writeln(n)
end.
"#;
    let expected = "\
#include <stdio.h>

int n;

int factorial(int k);

int factorial(int k) {
    int ret_factorial;
    if ((k <= 1)) {
        ret_factorial = 1;
    } else {
        ret_factorial = (k * factorial((k - 1)));
    }
    return ret_factorial;
}

int main() {
    n = factorial(5);
    printf(\"%d\\n\", n);
    return 0;
}
";
    assert_eq!(compile_ok(source), expected);
}

#[test]
fn test_loops() {
    let source = r#"
program loops;
var i, s: integer;
begin
  s := 0;
  for i := 10 downto 1 do s := s + i;
  while s > 0 do
  begin
    s := s - 7
  end
end.
"#;
    let c = compile_ok(source);
    assert!(c.contains("    for (i = 10; i >= 1; i--) {\n        s = (s + i);\n    }\n"), "{}", c);
    assert!(c.contains("    while ((s > 0)) {\n        s = (s - 7);\n    }\n"), "{}", c);
}

#[test]
fn test_exit_pulls_in_stdlib() {
    let c = compile_ok("program bye; begin writeln('bye'); exit end.");
    assert_eq!(
        c,
        "#include <stdio.h>\n#include <stdlib.h>\n\nint main() {\n    printf(\"bye\\n\");\n    exit(0);\n    return 0;\n}\n"
    );
}

#[rstest]
#[case("x := 1 + 2 * 3", "x = (1 + (2 * 3));")]
#[case("x := -(1 + 2) * 3", "x = ((-(1 + 2)) * 3);")]
#[case("x := x mod 3", "x = (x % 3);")]
#[case("x := x div 2", "x = (x / 2);")]
#[case("r := x / 2", "r = ((double)x / 2);")]
#[case("r := x", "r = x;")]
#[case("b := not (x > 1)", "b = (!(x > 1));")]
#[case("b := (x = 1) or (x <> 2)", "b = ((x == 1) || (x != 2));")]
#[case("b := true", "b = 1;")]
#[case("c := 'a'", "c = 'a';")]
fn test_expression_translation(#[case] statement: &str, #[case] expected: &str) {
    let source = format!(
        "program t;\nvar x: integer; r: real; b: boolean; c: char;\nbegin\n  {}\nend.\n",
        statement
    );
    let c = compile_ok(&source);
    assert!(c.contains(&format!("    {}\n", expected)), "{}", c);
}

#[test]
fn test_declaration_types() {
    let source = r#"
program decls;
const limit = 10; greeting = 'hello';
var x: integer; r: real; b: boolean; c: char;
begin
  writeln(greeting, limit)
end.
"#;
    let c = compile_ok(source);
    for line in [
        "    const int limit = 10;",
        "    const char *greeting = \"hello\";",
        "    int x;",
        "    double r;",
        "    int b;",
        "    char c;",
        "    printf(\"%s%d\\n\", greeting, limit);",
    ] {
        assert!(c.contains(line), "missing {:?} in\n{}", line, c);
    }
}

#[test]
fn test_arrays_rebase_subscripts() {
    let source = r#"
program arr;
var a: array[1..5] of integer; m: array[0..2, -1..1] of real; i: integer;
begin
  for i := 1 to 5 do a[i] := i * i;
  m[0, -1] := 0.5
end.
"#;
    let c = compile_ok(source);
    assert!(c.contains("    int a[5];\n"), "{}", c);
    assert!(c.contains("    double m[3][3];\n"), "{}", c);
    assert!(c.contains("        a[i - 1] = (i * i);\n"), "{}", c);

    let folded = compile_folded(source);
    assert!(folded.contains("    m[0][0] = 0.5;\n"), "{}", folded);
}

#[test]
fn test_read_takes_addresses() {
    let source = r#"
program input;
var x: integer; r: real;
procedure get(var v: integer);
begin
  read(v)
end;
begin
  readln(x, r);
  get(x)
end.
"#;
    let c = compile_ok(source);
    assert!(c.contains("    scanf(\"%d\", v);\n"), "{}", c);
    assert!(c.contains("    scanf(\"%d%lf\", &x, &r);\n"), "{}", c);
}

#[test]
fn test_folding_only_from_o1() {
    let source = "program f; var x: integer; begin x := 2 * 3 + 4 end.";
    assert!(compile_ok(source).contains("x = ((2 * 3) + 4);"));
    assert!(compile_folded(source).contains("x = 10;"));
}

#[test]
fn test_folding_keeps_division_by_zero() {
    let source = "program f; var x: integer; begin x := 1 div 0 end.";
    assert!(compile_folded(source).contains("x = (1 / 0);"));
}

#[test]
fn test_names_are_case_insensitive() {
    let source = "program Case; var Total: integer; begin TOTAL := 1; total := Total + 1 end.";
    let c = compile_ok(source);
    assert!(c.contains("    total = 1;\n"), "{}", c);
    assert!(c.contains("    total = (total + 1);\n"), "{}", c);
}

#[test]
fn test_c_keywords_are_renamed() {
    let source = "program k; var int, main: integer; begin int := 1; main := int end.";
    let c = compile_ok(source);
    assert!(c.contains("    int int_;\n"), "{}", c);
    assert!(c.contains("    main_ = int_;\n"), "{}", c);
}

#[test]
fn test_overloads_get_distinct_names() {
    let source = r#"
program over;
procedure show(i: integer);
begin
  writeln(i)
end;
procedure show(r: real);
begin
  writeln(r)
end;
begin
  show(1);
  show(2.5)
end.
"#;
    let c = compile_ok(source);
    assert!(c.contains("void show_1(int i);\n"), "{}", c);
    assert!(c.contains("void show_2(double r);\n"), "{}", c);
    assert!(c.contains("    show_1(1);\n    show_2(2.5);\n"), "{}", c);
}

#[test]
fn test_exit_inside_function_returns_result() {
    let source = r#"
program early;
var n: integer;
function pick(k: integer): integer;
begin
  pick := 0;
  if k > 3 then exit;
  pick := k
end;
begin
  n := pick(7)
end.
"#;
    let c = compile_ok(source);
    assert!(c.contains("    if ((k > 3)) {\n        return ret_pick;\n    }\n"), "{}", c);
    assert!(!c.contains("stdlib.h"), "{}", c);
}

#[test]
fn test_generated_names_avoid_declared_names() {
    let source = r#"
program names;
var ret_f: integer;
function f: integer;
begin
  f := 1
end;
procedure show_1;
begin
end;
procedure show(i: integer);
begin
end;
procedure show(r: real);
begin
end;
begin
  ret_f := f;
  show(1);
  show(2.5);
  show_1
end.
"#;
    let c = compile_ok(source);
    for text in [
        "int ret_f;\n",
        "int f(void) {\n    int ret_f_;\n    ret_f_ = 1;\n    return ret_f_;\n}\n",
        "void show_1(void);\n",
        "void show_1_(int i);\n",
        "void show_2(double r);\n",
        "    ret_f = f();\n    show_1_(1);\n    show_2(2.5);\n    show_1();\n",
    ] {
        assert!(c.contains(text), "missing {:?} in\n{}", text, c);
    }
}

#[test]
fn test_non_ascii_text_is_escaped() {
    let c = compile_ok("program accents; begin writeln('é'); writeln('crème 100%') end.");
    assert!(c.contains("    printf(\"\\303\\251\\n\");\n"), "{}", c);
    assert!(c.contains("    printf(\"cr\\303\\250me 100%%\\n\");\n"), "{}", c);
    assert!(c.is_ascii());
}

#[test]
fn test_conditions_keep_their_parentheses() {
    let c = compile_ok(
        "program p; var x: integer; begin if x > 1 then x := 2; while x > 0 do x := x - 1 end.",
    );
    assert!(c.contains("    if ((x > 1)) {\n        x = 2;\n    }\n"), "{}", c);
    assert!(c.contains("    while ((x > 0)) {\n        x = (x - 1);\n    }\n"), "{}", c);
}
