use std::time::Duration;

use camino::Utf8PathBuf;
use fanout_logging::TerminalColor;
use serde::Deserialize;

use crate::settings::{RunnerSettings, ServerSettings, Settings, TerminalSettings};
use crate::{Mode, ThreadCount};

const DEFAULT_GRACE_PERIOD_MS: u64 = 2_000;
const DEFAULT_SERVER_HOST: &str = "localhost";
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 60_000;

/// The contents of a `fanout.toml` file, or the same options gathered from the command line.
///
/// Every field is optional so that the two sources can be layered with [`Options::combine`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Options {
    /// Glob pattern selecting the spec files to run.
    pub spec: Option<String>,

    /// Number of runner instances to start.
    pub threads: Option<ThreadCount>,

    /// Mode the dev server is started in.
    pub mode: Option<Mode>,

    /// Run the test runner without its interactive UI.
    pub headless: Option<bool>,

    /// Base URL, or a comma-separated list of base URLs, to run against.
    pub url: Option<String>,

    pub runner: Option<RunnerOptions>,

    pub server: Option<ServerOptions>,

    pub terminal: Option<TerminalOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RunnerOptions {
    /// Path to the test-runner executable.
    pub binary: Option<Utf8PathBuf>,

    /// Extra `key=value` entries for the runner's `--config` argument.
    pub config: Option<Vec<String>>,

    /// Arguments forwarded verbatim to every runner instance.
    pub args: Option<Vec<String>>,

    /// Milliseconds to wait after `SIGTERM` before killing an instance.
    pub grace_period_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ServerOptions {
    /// Program and arguments that start the dev server.
    pub command: Option<Vec<String>>,

    pub host: Option<String>,

    pub port: Option<u16>,

    /// Milliseconds to wait for the dev server to accept connections.
    pub startup_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TerminalOptions {
    pub color: Option<TerminalColor>,

    pub no_progress: Option<bool>,
}

/// Layer two option sets, preferring values from `self`.
pub trait Combine {
    #[must_use]
    fn combine(self, other: Self) -> Self;
}

impl<T> Combine for Option<T> {
    fn combine(self, other: Self) -> Self {
        self.or(other)
    }
}

impl Combine for Options {
    fn combine(self, other: Self) -> Self {
        Self {
            spec: self.spec.combine(other.spec),
            threads: self.threads.combine(other.threads),
            mode: self.mode.combine(other.mode),
            headless: self.headless.combine(other.headless),
            url: self.url.combine(other.url),
            runner: combine_nested(self.runner, other.runner),
            server: combine_nested(self.server, other.server),
            terminal: combine_nested(self.terminal, other.terminal),
        }
    }
}

impl Combine for RunnerOptions {
    fn combine(self, other: Self) -> Self {
        Self {
            binary: self.binary.combine(other.binary),
            // Config entries and forwarded arguments accumulate: file values first, then ours.
            config: concat(other.config, self.config),
            args: concat(other.args, self.args),
            grace_period_ms: self.grace_period_ms.combine(other.grace_period_ms),
        }
    }
}

impl Combine for ServerOptions {
    fn combine(self, other: Self) -> Self {
        Self {
            command: self.command.combine(other.command),
            host: self.host.combine(other.host),
            port: self.port.combine(other.port),
            startup_timeout_ms: self.startup_timeout_ms.combine(other.startup_timeout_ms),
        }
    }
}

impl Combine for TerminalOptions {
    fn combine(self, other: Self) -> Self {
        Self {
            color: self.color.combine(other.color),
            no_progress: self.no_progress.combine(other.no_progress),
        }
    }
}

fn combine_nested<T: Combine>(ours: Option<T>, theirs: Option<T>) -> Option<T> {
    match (ours, theirs) {
        (Some(ours), Some(theirs)) => Some(ours.combine(theirs)),
        (ours, theirs) => ours.or(theirs),
    }
}

fn concat(first: Option<Vec<String>>, second: Option<Vec<String>>) -> Option<Vec<String>> {
    match (first, second) {
        (Some(mut first), Some(second)) => {
            first.extend(second);
            Some(first)
        }
        (first, second) => first.or(second),
    }
}

impl Options {
    /// Fill in defaults for everything left unset.
    pub fn to_settings(&self) -> Settings {
        let runner = self.runner.clone().unwrap_or_default();
        let server = self.server.clone().unwrap_or_default();
        let terminal = self.terminal.clone().unwrap_or_default();

        Settings {
            spec_pattern: self.spec.clone().filter(|spec| !spec.trim().is_empty()),
            threads: self.threads.unwrap_or_default(),
            mode: self.mode.unwrap_or_default(),
            headless: self.headless.unwrap_or(false),
            url: self.url.clone().filter(|url| !url.trim().is_empty()),
            runner: RunnerSettings {
                binary: runner.binary,
                config: runner.config.unwrap_or_default(),
                args: runner.args.unwrap_or_default(),
                grace_period: Duration::from_millis(
                    runner.grace_period_ms.unwrap_or(DEFAULT_GRACE_PERIOD_MS),
                ),
            },
            server: ServerSettings {
                command: server.command.unwrap_or_else(default_server_command),
                host: server
                    .host
                    .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
                port: server.port.unwrap_or(DEFAULT_SERVER_PORT),
                startup_timeout: Duration::from_millis(
                    server
                        .startup_timeout_ms
                        .unwrap_or(DEFAULT_STARTUP_TIMEOUT_MS),
                ),
            },
            terminal: TerminalSettings {
                color: terminal.color,
                no_progress: terminal.no_progress.unwrap_or(false),
            },
        }
    }
}

fn default_server_command() -> Vec<String> {
    ["npx", "vue-cli-service", "serve"]
        .into_iter()
        .map(String::from)
        .collect()
}
