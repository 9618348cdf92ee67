use std::time::Duration;

use camino::Utf8PathBuf;
use fanout_logging::TerminalColor;

use crate::{Mode, ThreadCount};

/// Fully resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `None` when neither the command line nor the config file named a pattern.
    pub spec_pattern: Option<String>,
    pub threads: ThreadCount,
    pub mode: Mode,
    pub headless: bool,
    /// `None` means a dev server has to be started.
    pub url: Option<String>,
    pub runner: RunnerSettings,
    pub server: ServerSettings,
    pub terminal: TerminalSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub binary: Option<Utf8PathBuf>,
    pub config: Vec<String>,
    pub args: Vec<String>,
    pub grace_period: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub command: Vec<String>,
    pub host: String,
    pub port: u16,
    pub startup_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSettings {
    pub color: Option<TerminalColor>,
    pub no_progress: bool,
}
