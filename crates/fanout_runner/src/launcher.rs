use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use fanout_metadata::{EnvVars, Settings};

use crate::partition::partition;
use crate::process::{self, exit_code};

/// Terminal state reported by a runner instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceEvent {
    /// The instance exited with this code.
    Exited(i32),

    /// The instance could not be started or could not be waited on.
    Errored(String),
}

/// A running (or failed-to-start) test-runner instance, as seen by the supervisor.
pub trait RunnerProcess {
    /// Check for termination without blocking. Returns an event exactly once.
    fn poll(&mut self) -> Option<InstanceEvent>;

    /// Ask the instance to shut down gracefully.
    fn request_stop(&mut self);

    /// Stop the instance immediately.
    fn force_kill(&mut self);
}

/// Starts runner instances. Launch failures are reported through the returned process.
pub trait Launcher {
    type Process: RunnerProcess;

    fn launch(&self, plan: &InstancePlan) -> Self::Process;
}

/// The base URLs to run against. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrls(Vec<String>);

impl TargetUrls {
    /// Split a comma-separated URL list. Returns `None` if no URL remains.
    ///
    /// Entries are trimmed and blank entries are dropped, so `a,,b` rotates over `a` and `b`
    /// rather than handing some instances an empty `baseUrl`.
    pub fn parse(value: &str) -> Option<Self> {
        let urls: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .collect();

        if urls.is_empty() { None } else { Some(Self(urls)) }
    }

    pub fn single(url: impl Into<String>) -> Self {
        Self(vec![url.into()])
    }

    /// The URL assigned to the instance with the given ordinal.
    pub fn for_instance(&self, ordinal: usize) -> &str {
        &self.0[ordinal % self.0.len()]
    }
}

/// Whether the runner executes specs headlessly or opens its interactive UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerMode {
    Run,
    Open,
}

impl RunnerMode {
    pub const fn from_headless(headless: bool) -> Self {
        if headless { Self::Run } else { Self::Open }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Open => "open",
        }
    }
}

/// Everything needed to start one runner instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstancePlan {
    pub ordinal: usize,
    pub base_url: String,
    pub specs: Vec<String>,
    pub args: Vec<String>,
}

/// Build the runner argument vector for one instance.
///
/// `<run|open> --config baseUrl=<url>[,k=v...] <forwarded...> --spec '<spec>,<spec>...'`
pub fn runner_args(
    mode: RunnerMode,
    base_url: &str,
    config: &[String],
    forwarded: &[String],
    specs: &[String],
) -> Vec<String> {
    let config_value = std::iter::once(format!("baseUrl={base_url}"))
        .chain(config.iter().cloned())
        .collect::<Vec<_>>()
        .join(",");

    let mut args = Vec::with_capacity(forwarded.len() + 5);
    args.push(mode.as_str().to_string());
    args.push("--config".to_string());
    args.push(config_value);
    args.extend(forwarded.iter().cloned());
    args.push("--spec".to_string());
    args.push(format!("'{}'", specs.join(",")));
    args
}

/// Partition `specs` and assign each chunk its URL and arguments.
pub fn plan_instances(settings: &Settings, specs: &[String], urls: &TargetUrls) -> Vec<InstancePlan> {
    let mode = RunnerMode::from_headless(settings.headless);

    partition(specs, settings.threads)
        .into_iter()
        .enumerate()
        .map(|(ordinal, specs)| {
            let base_url = urls.for_instance(ordinal).to_string();
            let args = runner_args(
                mode,
                &base_url,
                &settings.runner.config,
                &settings.runner.args,
                &specs,
            );
            InstancePlan {
                ordinal,
                base_url,
                specs,
                args,
            }
        })
        .collect()
}

/// Launches the real test-runner binary with inherited stdio.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    binary: PathBuf,
    cwd: Utf8PathBuf,
}

impl CommandLauncher {
    pub fn new(binary: PathBuf, cwd: &Utf8Path) -> Self {
        Self {
            binary,
            cwd: cwd.to_path_buf(),
        }
    }
}

impl Launcher for CommandLauncher {
    type Process = RunnerChild;

    fn launch(&self, plan: &InstancePlan) -> RunnerChild {
        tracing::debug!(
            ordinal = plan.ordinal,
            binary = %self.binary.display(),
            args = ?plan.args,
            "Spawning runner instance"
        );

        let spawned = Command::new(&self.binary)
            .args(&plan.args)
            .current_dir(&self.cwd)
            .env(EnvVars::FANOUT_INSTANCE_INDEX, plan.ordinal.to_string())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn();

        match spawned {
            Ok(child) => RunnerChild {
                state: ChildState::Running(child),
            },
            Err(err) => RunnerChild {
                state: ChildState::LaunchFailed(format!(
                    "Failed to start `{}`: {err}",
                    self.binary.display()
                )),
            },
        }
    }
}

/// A runner instance backed by an OS process.
#[derive(Debug)]
pub struct RunnerChild {
    state: ChildState,
}

#[derive(Debug)]
enum ChildState {
    Running(Child),
    LaunchFailed(String),
    Done,
}

impl RunnerChild {
    pub fn id(&self) -> Option<u32> {
        match &self.state {
            ChildState::Running(child) => Some(child.id()),
            ChildState::LaunchFailed(_) | ChildState::Done => None,
        }
    }
}

impl RunnerProcess for RunnerChild {
    fn poll(&mut self) -> Option<InstanceEvent> {
        let event = match &mut self.state {
            ChildState::Running(child) => match child.try_wait() {
                Ok(Some(status)) => InstanceEvent::Exited(exit_code(status)),
                Ok(None) => return None,
                Err(err) => {
                    process::force_kill(child);
                    InstanceEvent::Errored(format!("Failed to wait for runner: {err}"))
                }
            },
            ChildState::LaunchFailed(message) => InstanceEvent::Errored(std::mem::take(message)),
            ChildState::Done => return None,
        };

        self.state = ChildState::Done;
        Some(event)
    }

    fn request_stop(&mut self) {
        if let ChildState::Running(child) = &mut self.state {
            process::request_termination(child);
        }
    }

    fn force_kill(&mut self) {
        if let ChildState::Running(child) = &mut self.state {
            process::force_kill(child);
            self.state = ChildState::Done;
        }
    }
}
