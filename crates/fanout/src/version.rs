use std::fmt;

/// Version of the running binary, with the commit it was built from when the release build
/// provided one.
pub(crate) struct VersionInfo {
    version: &'static str,
    commit: Option<&'static str>,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version)?;
        if let Some(commit) = self.commit {
            write!(f, " ({commit})")?;
        }
        Ok(())
    }
}

pub(crate) fn version() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("FANOUT_COMMIT_SHORT_HASH").filter(|hash| !hash.is_empty()),
    }
}
