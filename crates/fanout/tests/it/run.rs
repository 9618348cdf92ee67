#![cfg(unix)]

use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

fn specs() -> TestContext {
    TestContext::with_specs(&[
        "cypress/e2e/a.cy.js",
        "cypress/e2e/b.cy.js",
        "cypress/e2e/c.cy.js",
    ])
    .with_fake_runner()
}

#[test]
fn test_single_instance_progress() {
    let context = specs();

    assert_cmd_snapshot!(
        context.command().args([
            "--spec",
            "cypress/e2e/*.cy.js",
            "--threads",
            "1",
            "--url",
            "http://localhost:9999",
        ]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    Starting runner instance 1 with baseUrl http://localhost:9999 (3 specs)
    Finished runner instance 1 with baseUrl http://localhost:9999

    run result: ok. exit code 0; finished in [TIME]

    ----- stderr -----
    "
    );

    assert_eq!(
        context.recorded_runs(),
        [[
            "open",
            "--config",
            "baseUrl=http://localhost:9999",
            "--spec",
            "'cypress/e2e/a.cy.js,cypress/e2e/b.cy.js,cypress/e2e/c.cy.js'",
        ]]
    );
}

#[test]
fn test_specs_are_split_across_instances() {
    let context = specs();

    assert_cmd_snapshot!(
        context.command().args([
            "--headless",
            "--spec",
            "cypress/e2e/*.cy.js",
            "--url",
            "http://localhost:9999",
            "--config",
            "video=false",
            "--no-progress",
        ]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----

    run result: ok. exit code 0; finished in [TIME]

    ----- stderr -----
    "
    );

    assert_eq!(
        context.recorded_runs(),
        [
            vec![
                "run",
                "--config",
                "baseUrl=http://localhost:9999,video=false",
                "--spec",
                "'cypress/e2e/a.cy.js,cypress/e2e/c.cy.js'",
            ],
            vec![
                "run",
                "--config",
                "baseUrl=http://localhost:9999,video=false",
                "--spec",
                "'cypress/e2e/b.cy.js'",
            ],
        ]
    );
}

#[test]
fn test_instances_get_their_own_url() {
    let context = specs();

    let output = context
        .command()
        .args([
            "-q",
            "--headless",
            "--spec",
            "cypress/e2e/*.cy.js",
            "--threads",
            "3",
            "--url",
            "http://a.test,http://b.test",
        ])
        .output()
        .expect("Failed to run fanout");

    assert!(output.status.success());

    let base_urls: Vec<_> = context
        .recorded_runs()
        .into_iter()
        .map(|args| args[2].clone())
        .collect();

    assert_eq!(
        base_urls,
        [
            "baseUrl=http://a.test",
            "baseUrl=http://b.test",
            "baseUrl=http://a.test",
        ]
    );
}

#[test]
fn test_runner_exit_code_is_propagated() {
    let context = specs();

    assert_cmd_snapshot!(
        context
            .command()
            .args([
                "--spec",
                "cypress/e2e/a.cy.js",
                "--url",
                "http://localhost:9999",
            ])
            .env("FAKE_RUNNER_EXIT", "3"),
        @r"
    success: false
    exit_code: 3
    ----- stdout -----
    Starting runner instance 1 with baseUrl http://localhost:9999 (1 specs)
    Failed runner instance 1 with baseUrl http://localhost:9999 (exit code 3)

    run result: FAILED. exit code 3; finished in [TIME]

    ----- stderr -----
    "
    );
}

#[test]
fn test_reserved_flags_are_not_forwarded() {
    let context = specs();

    let output = context
        .command()
        .args([
            "--headless",
            "--spec",
            "cypress/e2e/b.cy.js",
            "--url",
            "http://localhost:9999",
            "--no-progress",
            "--",
            "--browser",
            "firefox",
            "--threads",
            "9",
            "--spec=other.js",
            "--record",
        ])
        .output()
        .expect("Failed to run fanout");

    assert!(output.status.success());
    assert_eq!(
        context.recorded_runs(),
        [[
            "run",
            "--config",
            "baseUrl=http://localhost:9999",
            "--browser",
            "firefox",
            "--record",
            "--spec",
            "'cypress/e2e/b.cy.js'",
        ]]
    );
}

#[test]
fn test_missing_runner_binary() {
    let context = TestContext::with_specs(&["cypress/e2e/a.cy.js"]);

    assert_cmd_snapshot!(
        context
            .command()
            .args(["--spec", "cypress/e2e/a.cy.js", "--url", "http://localhost:9999"])
            .env("FANOUT_RUNNER_BINARY", "definitely-not-a-test-runner"),
        @r"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    fanout failed
      Cause: Could not find the test runner `definitely-not-a-test-runner`
      Cause: cannot find binary path
    "
    );
}
