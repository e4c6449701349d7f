use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

#[test]
fn loading_a_file_runs_its_definitions_and_prints_its_output() {
    let mut fixture = NamedTempFile::new().expect("failed to create fixture file");
    writeln!(
        fixture,
        "def {{sq}} (\\ {{x}} {{* x x}})\nprintln \"square of 7 is\" (sq 7)"
    )
    .expect("failed to write fixture");

    let output = Command::new(env!("CARGO_BIN_EXE_lispy"))
        .arg(fixture.path())
        .output()
        .expect("failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("square of 7 is 49"));
}

#[test]
fn loading_a_missing_file_reports_an_error_on_stderr() {
    let output = Command::new(env!("CARGO_BIN_EXE_lispy"))
        .arg("does-not-exist.lisp")
        .output()
        .expect("failed to run binary");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not load"));
}
