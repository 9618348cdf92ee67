use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use fanout_metadata::{ProjectMetadata, Settings};

mod binary;
pub mod path;
mod specs;

pub use binary::{DEFAULT_RUNNER, RunnerBinaryError, resolve_runner_binary};
pub use specs::{SpecPatternError, expand_spec_pattern};

/// A resolved run: where we are and what the user asked for.
#[derive(Debug, Clone)]
pub struct Project {
    cwd: Utf8PathBuf,
    metadata: ProjectMetadata,
    settings: Settings,
}

impl Project {
    pub fn from_metadata(cwd: Utf8PathBuf, metadata: ProjectMetadata) -> Self {
        let settings = metadata.to_settings();
        Self {
            cwd,
            metadata,
            settings,
        }
    }

    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    pub const fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Expand the configured spec pattern into the ordered list of spec files.
    pub fn collect_specs(&self) -> Result<Vec<String>, SpecPatternError> {
        expand_spec_pattern(self.settings.spec_pattern.as_deref(), &self.cwd)
    }

    pub fn runner_binary(&self) -> Result<PathBuf, RunnerBinaryError> {
        resolve_runner_binary(self.settings.runner.binary.as_deref(), &self.cwd)
    }
}
