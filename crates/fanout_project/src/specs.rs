use camino::{Utf8Path, Utf8PathBuf};
use globset::GlobBuilder;
use ignore::WalkBuilder;

use crate::path::{absolute, display_relative};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

#[derive(Debug, thiserror::Error)]
pub enum SpecPatternError {
    #[error(r#"Please provide --spec option, for example --spec="tests/e2e/specs/**/*.e2e.js""#)]
    Missing,

    #[error("Invalid spec pattern `{pattern}`")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("No spec files match `{0}`")]
    NoMatches(String),
}

/// Expand a spec glob into the sorted list of matching files.
///
/// Relative patterns are matched against paths relative to `cwd` and returned in that form;
/// absolute patterns yield absolute paths. Hidden files and directories are never matched by a
/// wildcard. The result is never empty.
pub fn expand_spec_pattern(
    pattern: Option<&str>,
    cwd: &Utf8Path,
) -> Result<Vec<String>, SpecPatternError> {
    let pattern = pattern
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .ok_or(SpecPatternError::Missing)?;
    let normalized = pattern.strip_prefix("./").unwrap_or(pattern);

    let Some(base) = wildcard_base(normalized) else {
        // No wildcards: the pattern names a single file.
        return if absolute(normalized, cwd).is_file() {
            Ok(vec![normalized.to_string()])
        } else {
            Err(SpecPatternError::NoMatches(pattern.to_string()))
        };
    };

    let matcher = GlobBuilder::new(normalized)
        .literal_separator(true)
        .build()
        .map_err(|source| SpecPatternError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let root = absolute(&base, cwd);
    let is_absolute = Utf8Path::new(normalized).is_absolute();

    tracing::debug!(pattern = normalized, root = %root, "Expanding spec pattern");

    let mut specs = Vec::new();

    if root.is_dir() {
        for entry in WalkBuilder::new(&root)
            .standard_filters(false)
            .hidden(true)
            .build()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!("Skipping unreadable entry: {err}");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|file_type| file_type.is_file()) {
                continue;
            }

            let Some(path) = Utf8Path::from_path(entry.path()) else {
                continue;
            };

            let candidate = if is_absolute {
                path.to_string()
            } else {
                display_relative(path, cwd)
            };

            if matcher.is_match(&candidate) {
                specs.push(candidate);
            }
        }
    }

    specs.sort();
    specs.dedup();

    if specs.is_empty() {
        return Err(SpecPatternError::NoMatches(pattern.to_string()));
    }

    tracing::debug!(count = specs.len(), "Collected spec files");

    Ok(specs)
}

/// The longest leading directory of `pattern` that contains no wildcard, or `None` if the
/// pattern has no wildcard at all.
fn wildcard_base(pattern: &str) -> Option<Utf8PathBuf> {
    if !pattern.contains(GLOB_META) {
        return None;
    }

    let literal: Vec<&str> = pattern
        .split('/')
        .take_while(|segment| !segment.contains(GLOB_META))
        .collect();

    let base = literal.join("/");

    if base.is_empty() && pattern.starts_with('/') {
        Some(Utf8PathBuf::from("/"))
    } else {
        Some(Utf8PathBuf::from(base))
    }
}
