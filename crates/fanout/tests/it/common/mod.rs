use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use insta::internals::SettingsBindDropGuard;
use tempfile::TempDir;

/// A fake test runner that records its arguments, one per line, and exits with
/// `FAKE_RUNNER_EXIT` (default 0).
#[cfg(unix)]
const FAKE_RUNNER: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "$FAKE_RUNNER_OUT/instance-$FANOUT_INSTANCE_INDEX.args"
exit "${FAKE_RUNNER_EXIT:-0}"
"#;

pub(crate) struct TestContext {
    _temp_dir: TempDir,
    project_dir: PathBuf,
    _settings_scope: SettingsBindDropGuard,
}

impl TestContext {
    pub(crate) fn new() -> Self {
        let temp_dir = TempDir::with_prefix("fanout-test").expect("Failed to create temp dir");
        let project_dir = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp dir")
            .join("project");
        fs::create_dir_all(project_dir.join("runs")).expect("Failed to create project dir");

        let mut settings = insta::Settings::clone_current();
        settings.add_filter(&regex::escape(&project_dir.display().to_string()), "<project>");
        settings.add_filter(r"finished in \d+(\.\d+)?s", "finished in [TIME]");
        settings.add_filter(r"\x1b\[[0-9;]*m", "");
        let settings_scope = settings.bind_to_scope();

        Self {
            _temp_dir: temp_dir,
            project_dir,
            _settings_scope: settings_scope,
        }
    }

    pub(crate) fn with_specs(specs: &[&str]) -> Self {
        let context = Self::new();
        for spec in specs {
            context.write_file(spec, "describe('spec', () => {})\n");
        }
        context
    }

    pub(crate) fn root(&self) -> &Path {
        &self.project_dir
    }

    pub(crate) fn write_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.project_dir.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(path, content).expect("Failed to write file");
    }

    /// Install the fake runner in `node_modules/.bin` where fanout looks for it.
    #[cfg(unix)]
    pub(crate) fn with_fake_runner(self) -> Self {
        use std::os::unix::fs::PermissionsExt;

        self.write_file("node_modules/.bin/cypress", FAKE_RUNNER);
        let path = self.project_dir.join("node_modules/.bin/cypress");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make the fake runner executable");
        self
    }

    /// Arguments each fake runner instance was started with, ordered by instance.
    pub(crate) fn recorded_runs(&self) -> Vec<Vec<String>> {
        let mut runs: Vec<_> = fs::read_dir(self.project_dir.join("runs"))
            .expect("Failed to read the runs dir")
            .map(|entry| entry.expect("Failed to read dir entry").path())
            .collect();
        runs.sort();

        runs.into_iter()
            .map(|path| {
                fs::read_to_string(path)
                    .expect("Failed to read recorded args")
                    .lines()
                    .map(String::from)
                    .collect()
            })
            .collect()
    }

    pub(crate) fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_fanout"));
        command
            .current_dir(&self.project_dir)
            .arg("run")
            .env("FAKE_RUNNER_OUT", self.project_dir.join("runs"))
            .env_remove("FANOUT_CONFIG_FILE")
            .env_remove("FANOUT_RUNNER_BINARY")
            .env_remove("FANOUT_LOG")
            .env_remove("FANOUT_LOG_PROFILE")
            .env("NO_COLOR", "1");
        command
    }
}
