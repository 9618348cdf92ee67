use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

#[test]
fn test_missing_spec_option() {
    let context = TestContext::new();

    assert_cmd_snapshot!(context.command(), @r#"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    fanout failed
      Cause: Please provide --spec option, for example --spec="tests/e2e/specs/**/*.e2e.js"
    "#);
}

#[test]
fn test_threads_must_be_a_number() {
    let context = TestContext::with_specs(&["cypress/e2e/a.cy.js"]);

    let output = context
        .command()
        .args(["--spec", "cypress/e2e/*.cy.js", "--threads", "abc"])
        .output()
        .expect("Failed to run fanout");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr.contains("Please provide --threads option as a positive number, got `abc`"),
        "unexpected stderr: {stderr}"
    );
    assert!(context.recorded_runs().is_empty());
}

#[test]
fn test_zero_threads_are_rejected() {
    let context = TestContext::with_specs(&["cypress/e2e/a.cy.js"]);

    let output = context
        .command()
        .args(["--spec", "cypress/e2e/*.cy.js", "-t", "0"])
        .output()
        .expect("Failed to run fanout");

    assert_eq!(output.status.code(), Some(2));
    assert!(context.recorded_runs().is_empty());
}

#[test]
fn test_no_matching_specs() {
    let context = TestContext::new();

    assert_cmd_snapshot!(context.command().args(["--spec", "cypress/e2e/**/*.cy.js"]), @r"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    fanout failed
      Cause: No spec files match `cypress/e2e/**/*.cy.js`
    ");
}

#[test]
fn test_version() {
    let context = TestContext::new();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_fanout"))
        .current_dir(context.root())
        .arg("version")
        .output()
        .expect("Failed to run fanout");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(
        stdout.starts_with(&format!("fanout {}", env!("CARGO_PKG_VERSION"))),
        "unexpected stdout: {stdout}"
    );
}
