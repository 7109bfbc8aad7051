// Command-line behaviour of the pascal2c binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const SIMPLE: &str = "program Simple;\nvar x, y: integer;\nbegin\n  x := 2 + 3;\n  y := x - 1\nend.\n";

const SIMPLE_C: &str = "#include <stdio.h>\n\nint main() {\n    int x;\n    int y;\n    x = (2 + 3);\n    y = (x - 1);\n    return 0;\n}\n";

fn pascal2c(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pascal2c"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run pascal2c")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_no_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = pascal2c(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No input file provided"));
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    for flag in ["-v", "--version"] {
        let output = pascal2c(dir.path(), &[flag]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(
            stdout.trim(),
            format!("pascal2c {}", env!("CARGO_PKG_VERSION"))
        );
    }
}

#[test]
fn test_explicit_output_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("simple.pas"), SIMPLE).unwrap();

    let output = pascal2c(dir.path(), &["simple.pas", "-o", "out.c"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(fs::read_to_string(dir.path().join("out.c")).unwrap(), SIMPLE_C);
}

#[test]
fn test_default_output_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("simple.pas"), SIMPLE).unwrap();

    let output = pascal2c(dir.path(), &["simple.pas"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(fs::read_to_string(dir.path().join("target.c")).unwrap(), SIMPLE_C);
}

#[test]
fn test_opt_level_folds_constants() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("simple.pas"), SIMPLE).unwrap();

    let output = pascal2c(dir.path(), &["-O1", "simple.pas", "-o", "folded.c"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let c = fs::read_to_string(dir.path().join("folded.c")).unwrap();
    assert!(c.contains("    x = 5;\n"), "{}", c);
}

#[test]
fn test_opt_level_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("simple.pas"), SIMPLE).unwrap();

    let output = pascal2c(dir.path(), &["-O", "7", "simple.pas"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("target.c").exists());
}

#[test]
fn test_errors_leave_no_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("bad.pas"),
        "program bad;\nvar x: integer;\nbegin\n  x := y;\n  z := 1\nend.\n",
    )
    .unwrap();

    let output = pascal2c(dir.path(), &["bad.pas", "-o", "bad.c"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("bad.c").exists());

    let err = stderr(&output);
    assert!(err.contains("bad.pas:4:8: name error: 'y' is not declared"), "{}", err);
    assert!(err.contains("bad.pas:5:3: name error: 'z' is not declared"), "{}", err);
    assert!(err.contains("bad.pas: 2 error(s), no output written"), "{}", err);
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = pascal2c(dir.path(), &["nowhere.pas"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nowhere.pas: error: "));
}

#[test]
fn test_multiple_inputs_write_beside_each_source() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("first.pas"), SIMPLE).unwrap();
    fs::write(
        dir.path().join("second.pas"),
        "program second; begin writeln('hi') end.",
    )
    .unwrap();

    let output = pascal2c(dir.path(), &["first.pas", "second.pas", "-o", "ignored.c"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(fs::read_to_string(dir.path().join("first.c")).unwrap(), SIMPLE_C);
    assert!(fs::read_to_string(dir.path().join("second.c"))
        .unwrap()
        .contains("printf(\"hi\\n\");"));
    assert!(!dir.path().join("ignored.c").exists());
    assert!(!dir.path().join("target.c").exists());
}

#[test]
fn test_one_bad_input_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.pas"), SIMPLE).unwrap();
    fs::write(dir.path().join("bad.pas"), "program bad; begin x := end.").unwrap();

    let output = pascal2c(dir.path(), &["good.pas", "bad.pas"]);
    assert!(!output.status.success());
    assert!(dir.path().join("good.c").exists());
    assert!(!dir.path().join("bad.c").exists());
}
