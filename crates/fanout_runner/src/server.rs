use std::net::{TcpStream, ToSocketAddrs};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use fanout_metadata::{Mode, ServerSettings};

use crate::process::{self, exit_code};

const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(250);
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// A server the runner instances test against.
pub trait AuxiliaryServer {
    fn url(&self) -> &str;

    /// Shut the server down. Closing twice is a no-op.
    fn close(&mut self) -> anyhow::Result<()>;
}

/// Starts an [`AuxiliaryServer`] when no explicit URL was given.
pub trait ServerStarter {
    fn start(&self, mode: Mode) -> anyhow::Result<Box<dyn AuxiliaryServer>>;
}

/// Starts the project's dev server as a child process.
#[derive(Debug, Clone)]
pub struct DevServerStarter {
    command: Vec<String>,
    host: String,
    port: u16,
    startup_timeout: Duration,
    cwd: Utf8PathBuf,
}

impl DevServerStarter {
    pub fn new(settings: &ServerSettings, cwd: &Utf8Path) -> Self {
        Self {
            command: settings.command.clone(),
            host: settings.host.clone(),
            port: settings.port,
            startup_timeout: settings.startup_timeout,
            cwd: cwd.to_path_buf(),
        }
    }

    /// The URL the server will be reachable at once started.
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl ServerStarter for DevServerStarter {
    fn start(&self, mode: Mode) -> anyhow::Result<Box<dyn AuxiliaryServer>> {
        let Some((program, args)) = self.command.split_first() else {
            bail!("The dev server command is empty");
        };

        tracing::info!(
            command = %self.command.join(" "),
            %mode,
            port = self.port,
            "Starting dev server"
        );

        let child = Command::new(program)
            .args(args)
            .arg("--mode")
            .arg(mode.as_str())
            .arg("--port")
            .arg(self.port.to_string())
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start the dev server `{}`", self.command.join(" ")))?;

        let mut server = DevServer {
            child,
            url: self.url(),
            closed: false,
        };

        if let Err(err) = server.wait_until_ready(&self.host, self.port, self.startup_timeout) {
            let _ = server.close();
            return Err(err);
        }

        tracing::info!(url = %server.url, "Dev server is accepting connections");

        Ok(Box::new(server))
    }
}

/// A dev server child process. Closed on drop.
#[derive(Debug)]
pub struct DevServer {
    child: Child,
    url: String,
    closed: bool,
}

impl DevServer {
    fn wait_until_ready(&mut self, host: &str, port: u16, timeout: Duration) -> anyhow::Result<()> {
        let start = Instant::now();

        while start.elapsed() < timeout {
            if let Some(status) = self
                .child
                .try_wait()
                .context("Failed to check on the dev server")?
            {
                bail!(
                    "The dev server exited with code {} before accepting connections",
                    exit_code(status)
                );
            }

            if is_accepting(host, port) {
                return Ok(());
            }

            std::thread::sleep(READINESS_POLL_INTERVAL);
        }

        bail!(
            "The dev server did not accept connections on {host}:{port} within {}s",
            timeout.as_secs()
        )
    }
}

impl AuxiliaryServer for DevServer {
    fn url(&self) -> &str {
        &self.url
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }

        tracing::info!(pid = self.child.id(), "Stopping dev server");

        if self.child.try_wait()?.is_some() {
            return Ok(());
        }

        process::request_termination(&mut self.child);

        let start = Instant::now();
        while start.elapsed() < SHUTDOWN_GRACE_PERIOD {
            if self.child.try_wait()?.is_some() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        process::force_kill(&mut self.child);
        Ok(())
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn is_accepting(host: &str, port: u16) -> bool {
    let Ok(addrs) = (host, port).to_socket_addrs() else {
        return false;
    };

    addrs
        .into_iter()
        .any(|addr| TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok())
}
