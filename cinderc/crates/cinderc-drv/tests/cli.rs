//! CLI integration tests for the `cinderc` binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn source_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".c")
        .tempfile()
        .expect("create temp file");
    file.write_all(content.as_bytes()).expect("write source");
    file
}

fn cinderc() -> Command {
    Command::cargo_bin("cinderc").expect("binary built")
}

#[test]
fn test_successful_compile_dumps_module_to_stdout() {
    let file = source_file("int add3(int a) { return a + 3; }\n");

    cinderc()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("define i32 @add3"));
}

#[test]
fn test_compile_error_exits_with_status_one() {
    let file = source_file("int f(void) { break; }\n");

    cinderc()
        .arg(file.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error at"))
        .stderr(predicate::str::contains("break outside of loop"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_diagnostic_names_file_and_line() {
    let file = source_file("int f(void) {\n  return 0\n}\n");
    let path = file.path().display().to_string();

    cinderc()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!("error at {}(3)", path)))
        .stderr(predicate::str::contains("expected ;, but got }"));
}

#[test]
fn test_lex_error_is_reported() {
    let file = source_file("int f(void) { return '\\q'; }\n");

    cinderc()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown escape sequence '\\q'"));
}

#[test]
fn test_missing_file_is_reported() {
    cinderc()
        .arg("no/such/file.c")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no/such/file.c"));
}

#[test]
fn test_usage_without_arguments() {
    cinderc()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("usage:"));
}

#[test]
fn test_extra_arguments_are_rejected() {
    cinderc()
        .args(["a.c", "b.c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage:"));
}
