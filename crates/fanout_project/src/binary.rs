use std::path::PathBuf;

use camino::Utf8Path;
use fanout_metadata::EnvVars;

/// Test runner used when nothing else is configured.
pub const DEFAULT_RUNNER: &str = "cypress";

#[derive(Debug, thiserror::Error)]
#[error("Could not find the test runner `{name}`")]
pub struct RunnerBinaryError {
    name: String,
    #[source]
    source: which::Error,
}

/// Locate the test-runner executable.
///
/// In order: the configured binary, `FANOUT_RUNNER_BINARY`, the project's
/// `node_modules/.bin/cypress`, and finally `cypress` on `PATH`.
pub fn resolve_runner_binary(
    configured: Option<&Utf8Path>,
    cwd: &Utf8Path,
) -> Result<PathBuf, RunnerBinaryError> {
    let explicit = configured
        .map(ToString::to_string)
        .or_else(|| std::env::var(EnvVars::FANOUT_RUNNER_BINARY).ok())
        .filter(|name| !name.is_empty());

    if let Some(name) = explicit {
        return find(&name, cwd);
    }

    let local = cwd.join("node_modules").join(".bin").join(DEFAULT_RUNNER);
    if local.is_file() {
        tracing::debug!(path = %local, "Using project-local test runner");
        return Ok(local.into_std_path_buf());
    }

    find(DEFAULT_RUNNER, cwd)
}

fn find(name: &str, cwd: &Utf8Path) -> Result<PathBuf, RunnerBinaryError> {
    let paths = std::env::var_os("PATH");
    which::which_in(name, paths, cwd).map_err(|source| RunnerBinaryError {
        name: name.to_string(),
        source,
    })
}
