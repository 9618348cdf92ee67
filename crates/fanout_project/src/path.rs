use camino::{Utf8Path, Utf8PathBuf};

/// Resolve `path` against `cwd` unless it is already absolute.
pub fn absolute(path: impl AsRef<Utf8Path>, cwd: impl AsRef<Utf8Path>) -> Utf8PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.as_ref().join(path)
    }
}

/// Render `path` relative to `cwd` with `/` separators, as glob patterns are written.
pub(crate) fn display_relative(path: &Utf8Path, cwd: &Utf8Path) -> String {
    match path.strip_prefix(cwd) {
        Ok(relative) => relative
            .components()
            .map(|component| component.as_str())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string(),
    }
}
