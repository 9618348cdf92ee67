use std::sync::OnceLock;

use crossbeam_channel::{Receiver, Sender, unbounded};

/// The exit code of a run stopped by `signal`, following the shell's `128 + n` convention.
pub const fn interrupted_exit_code(signal: i32) -> i32 {
    128 + signal
}

static SHUTDOWN: OnceLock<(Sender<i32>, Receiver<i32>)> = OnceLock::new();

/// A receiver that yields the signal number every time the process is asked to stop.
///
/// On Unix this is `SIGINT`, `SIGTERM`, `SIGHUP`, `SIGUSR1` or `SIGUSR2`. Other platforms only
/// see Ctrl+C, reported as `SIGINT`.
///
/// The handler is installed on first use and lives for the rest of the process.
pub fn shutdown_receiver() -> Receiver<i32> {
    let (_, receiver) = SHUTDOWN.get_or_init(|| {
        let (sender, receiver) = unbounded();

        if let Err(err) = install_handler(sender.clone()) {
            tracing::warn!("Failed to install the shutdown signal handler: {err:#}");
        }

        (sender, receiver)
    });

    receiver.clone()
}

#[cfg(unix)]
fn install_handler(sender: Sender<i32>) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])?;

    std::thread::Builder::new()
        .name("fanout-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                tracing::debug!(signal, "Received shutdown signal");
                if sender.send(signal).is_err() {
                    break;
                }
            }
        })?;

    Ok(())
}

#[cfg(not(unix))]
fn install_handler(sender: Sender<i32>) -> anyhow::Result<()> {
    const SIGINT: i32 = 2;

    ctrlc::set_handler(move || {
        let _ = sender.send(SIGINT);
    })?;

    Ok(())
}
