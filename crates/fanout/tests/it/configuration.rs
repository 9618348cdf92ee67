use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

#[test]
fn test_spec_and_threads_from_config_file() {
    let context = TestContext::with_specs(&["specs/a.js", "specs/b.js", "specs/c.js"]);
    context.write_file(
        "fanout.toml",
        r#"
spec = "specs/*.js"
threads = 3

[server]
host = "127.0.0.1"
port = 4173
"#,
    );

    assert_cmd_snapshot!(context.command().arg("--dry-run"), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    <instance 1> http://127.0.0.1:4173/
      specs/a.js
    <instance 2> http://127.0.0.1:4173/
      specs/b.js
    <instance 3> http://127.0.0.1:4173/
      specs/c.js

    3 specs across 3 runner instances

    ----- stderr -----
    ");
}

#[test]
fn test_command_line_overrides_config_file() {
    let context = TestContext::with_specs(&["specs/a.js", "specs/b.js", "other/x.js"]);
    context.write_file(
        "fanout.toml",
        r#"
spec = "specs/*.js"
threads = 3
url = "http://from-config.test"
"#,
    );

    assert_cmd_snapshot!(
        context.command().args(["--dry-run", "--spec", "other/*.js", "-t", "1"]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    <instance 1> http://from-config.test
      other/x.js

    1 specs across 1 runner instances

    ----- stderr -----
    "
    );
}

#[test]
fn test_explicit_config_file() {
    let context = TestContext::with_specs(&["specs/a.js"]);
    context.write_file("ci/fanout.toml", "spec = \"specs/a.js\"\nurl = \"http://ci.test\"\n");

    assert_cmd_snapshot!(
        context.command().args(["--dry-run", "--config-file", "ci/fanout.toml"]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    <instance 1> http://ci.test
      specs/a.js

    1 specs across 1 runner instances

    ----- stderr -----
    "
    );
}

#[cfg(unix)]
#[test]
fn test_missing_config_file() {
    let context = TestContext::new();

    assert_cmd_snapshot!(
        context.command().args(["--config-file", "missing.toml"]),
        @r"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    fanout failed
      Cause: Failed to read `<project>/missing.toml`
      Cause: No such file or directory (os error 2)
    "
    );
}

#[test]
fn test_unknown_config_key() {
    let context = TestContext::new();
    context.write_file("fanout.toml", "workers = 4\n");

    let output = context
        .command()
        .arg("--dry-run")
        .output()
        .expect("Failed to run fanout");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr.contains("Cause: Failed to parse `"),
        "unexpected stderr: {stderr}"
    );
    assert!(stderr.contains("unknown field `workers`"), "unexpected stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn test_runner_options_from_config_file() {
    let context = TestContext::with_specs(&["specs/a.js"]).with_fake_runner();
    context.write_file(
        "fanout.toml",
        r#"
spec = "specs/a.js"
headless = true
url = "http://localhost:9999"

[runner]
config = ["video=false"]
args = ["--browser", "electron"]
"#,
    );

    let output = context
        .command()
        .args(["-q", "--config", "retries=2", "--", "--record"])
        .output()
        .expect("Failed to run fanout");

    assert!(output.status.success());
    assert_eq!(
        context.recorded_runs(),
        [[
            "run",
            "--config",
            "baseUrl=http://localhost:9999,video=false,retries=2",
            "--browser",
            "electron",
            "--record",
            "--spec",
            "'specs/a.js'",
        ]]
    );
}
