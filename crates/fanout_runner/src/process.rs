use std::process::{Child, ExitStatus};

/// Exit code reported for a process that failed without producing one.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// The exit code of `status`, mapping death-by-signal to `128 + signal` on Unix.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    FAILURE_EXIT_CODE
}

/// Ask `child` to shut down. Falls back to killing it where `SIGTERM` is unavailable.
pub(crate) fn request_termination(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let Ok(pid) = i32::try_from(child.id()) else {
            return;
        };

        if let Err(err) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            tracing::debug!(pid, "Failed to send SIGTERM: {err}");
        }
    }

    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }
}

/// Kill `child` and reap it.
pub(crate) fn force_kill(child: &mut Child) {
    if let Err(err) = child.kill() {
        tracing::debug!(pid = child.id(), "Failed to kill process: {err}");
    }
    let _ = child.wait();
}
