use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

mod env;
mod options;
mod settings;

pub use env::EnvVars;
pub use options::{Combine, Options, RunnerOptions, ServerOptions, TerminalOptions};
pub use settings::{RunnerSettings, ServerSettings, Settings, TerminalSettings};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "fanout.toml";

/// The mode the dev server is started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Development,
    #[default]
    Production,
    Test,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of runner instances to start. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "usize")]
pub struct ThreadCount(NonZeroUsize);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Please provide --threads option as a positive number, got `{0}`")]
pub struct InvalidThreadCount(String);

impl ThreadCount {
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ThreadCount {
    fn default() -> Self {
        Self(NonZeroUsize::MIN.saturating_add(1))
    }
}

impl TryFrom<usize> for ThreadCount {
    type Error = InvalidThreadCount;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or_else(|| InvalidThreadCount(value.to_string()))
    }
}

impl FromStr for ThreadCount {
    type Err = InvalidThreadCount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<NonZeroUsize>()
            .map(Self)
            .map_err(|_| InvalidThreadCount(s.to_string()))
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Failed to read `{path}`")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse `{path}`")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Options loaded from a configuration file, if any was found.
#[derive(Debug, Clone, Default)]
pub struct ProjectMetadata {
    config_file: Option<Utf8PathBuf>,
    options: Options,
}

impl ProjectMetadata {
    /// Load `fanout.toml` from `cwd` when it exists.
    pub fn discover(cwd: &Utf8Path) -> Result<Self, ConfigFileError> {
        let candidate = cwd.join(CONFIG_FILE_NAME);

        if candidate.is_file() {
            Self::from_config_file(candidate)
        } else {
            tracing::debug!(cwd = %cwd, "No `{CONFIG_FILE_NAME}` found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_config_file(path: Utf8PathBuf) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigFileError::Read {
            path: path.clone(),
            source,
        })?;

        let options = toml::from_str(&content).map_err(|source| ConfigFileError::Parse {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path, "Loaded configuration file");

        Ok(Self {
            config_file: Some(path),
            options,
        })
    }

    pub fn config_file(&self) -> Option<&Utf8Path> {
        self.config_file.as_deref()
    }

    pub const fn options(&self) -> &Options {
        &self.options
    }

    pub fn apply_overrides(&mut self, overrides: &ProjectOptionsOverrides) {
        self.options = overrides
            .options
            .clone()
            .combine(std::mem::take(&mut self.options));
    }

    pub fn to_settings(&self) -> Settings {
        self.options.to_settings()
    }
}

/// Options from the command line, which take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ProjectOptionsOverrides {
    pub options: Options,
}

impl ProjectOptionsOverrides {
    pub const fn new(options: Options) -> Self {
        Self { options }
    }
}
