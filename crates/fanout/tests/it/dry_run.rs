use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

#[test]
fn test_dry_run_against_dev_server() {
    let context = TestContext::with_specs(&[
        "cypress/e2e/a.cy.js",
        "cypress/e2e/b.cy.js",
        "cypress/e2e/c.cy.js",
    ]);

    assert_cmd_snapshot!(context.command().args(["--dry-run", "--spec", "cypress/e2e/*.cy.js"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    <instance 1> http://localhost:8080/
      cypress/e2e/a.cy.js
      cypress/e2e/c.cy.js
    <instance 2> http://localhost:8080/
      cypress/e2e/b.cy.js

    3 specs across 2 runner instances

    ----- stderr -----
    ");

    assert!(context.recorded_runs().is_empty());
}

#[test]
fn test_dry_run_with_url_list() {
    let context = TestContext::with_specs(&[
        "specs/one.js",
        "specs/two.js",
        "specs/three.js",
        "specs/four.js",
    ]);

    assert_cmd_snapshot!(
        context.command().args([
            "--dry-run",
            "--spec=specs/*.js",
            "--threads=3",
            "--url=http://a.test,http://b.test",
        ]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    <instance 1> http://a.test
      specs/four.js
      specs/two.js
    <instance 2> http://b.test
      specs/one.js
    <instance 3> http://a.test
      specs/three.js

    4 specs across 3 runner instances

    ----- stderr -----
    "
    );
}

#[test]
fn test_dry_run_never_plans_empty_instances() {
    let context = TestContext::with_specs(&["specs/only.js"]);

    assert_cmd_snapshot!(
        context.command().args(["--dry-run", "--spec", "specs/only.js", "--threads", "8"]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    <instance 1> http://localhost:8080/
      specs/only.js

    1 specs across 1 runner instances

    ----- stderr -----
    "
    );
}
