use std::io::{StdoutLock, Write as _};

use crate::VerbosityLevel;

/// Routes user-facing output according to the requested verbosity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    verbosity: VerbosityLevel,
    no_progress: bool,
}

impl Printer {
    pub const fn new(verbosity: VerbosityLevel, no_progress: bool) -> Self {
        Self {
            verbosity,
            no_progress,
        }
    }

    /// Output the user explicitly asked for, such as `--dry-run` plans or the version.
    pub fn stream_for_requested_summary(self) -> Stdout {
        Stdout::enabled()
    }

    /// Final results and failures, shown even with `-q`.
    pub fn stream_for_failure_summary(self) -> Stdout {
        Stdout::enabled()
    }

    /// Per-instance progress lines ("Starting instance ..."), hidden with `-q` or `--no-progress`.
    pub fn stream_for_progress(self) -> Stdout {
        if self.verbosity.is_quiet() || self.no_progress {
            Stdout::disabled()
        } else {
            Stdout::enabled()
        }
    }
}

#[derive(Debug)]
pub struct Stdout {
    enabled: bool,
    lock: Option<StdoutLock<'static>>,
}

impl Stdout {
    const fn enabled() -> Self {
        Self {
            enabled: true,
            lock: None,
        }
    }

    const fn disabled() -> Self {
        Self {
            enabled: false,
            lock: None,
        }
    }

    /// Hold the stdout lock for the lifetime of the returned stream.
    #[must_use]
    pub fn lock(mut self) -> Self {
        if self.enabled {
            self.lock = Some(std::io::stdout().lock());
        }
        self
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl std::fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        if !self.enabled {
            return Ok(());
        }

        let result = match self.lock.as_mut() {
            Some(lock) => lock.write_all(s.as_bytes()),
            None => std::io::stdout().write_all(s.as_bytes()),
        };

        result.map_err(|_| std::fmt::Error)
    }
}

impl Drop for Stdout {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.as_mut() {
            let _ = lock.flush();
        }
    }
}
