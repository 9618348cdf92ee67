use std::fmt::Write as _;
use std::time::{Duration, Instant};

use anyhow::Result;
use colored::Colorize;
use crossbeam_channel::Receiver;
use fanout_logging::Printer;
use fanout_metadata::Settings;
use fanout_project::Project;

use crate::launcher::{
    CommandLauncher, InstanceEvent, InstancePlan, Launcher, RunnerProcess, TargetUrls,
    plan_instances,
};
use crate::process::FAILURE_EXIT_CODE;
use crate::server::{AuxiliaryServer, DevServerStarter, ServerStarter};
use crate::shutdown::{interrupted_exit_code, shutdown_receiver};

/// How long the supervisor waits for a shutdown request between polls of its instances.
const INSTANCE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Poll interval while waiting for stopped instances to exit.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Configuration for a parallel run.
#[derive(Debug, Clone)]
pub struct ParallelRunConfig {
    /// Install a signal handler so that an interrupt tears the run down.
    pub create_ctrlc_handler: bool,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every instance finished; `exit_code` is the first one reported.
    Completed { exit_code: i32 },

    /// The run was interrupted and the remaining instances were stopped.
    Interrupted { exit_code: i32 },
}

impl RunOutcome {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Completed { exit_code } | Self::Interrupted { exit_code } => exit_code,
        }
    }
}

/// Collect specs, start the dev server if needed, and run every partition in parallel.
pub fn run_parallel(
    project: &Project,
    config: &ParallelRunConfig,
    printer: Printer,
) -> Result<RunOutcome> {
    let settings = project.settings();

    let specs = project.collect_specs()?;
    let binary = project.runner_binary()?;

    tracing::debug!(
        specs = specs.len(),
        threads = settings.threads.get(),
        binary = %binary.display(),
        "Prepared parallel run"
    );

    let launcher = CommandLauncher::new(binary, project.cwd());
    let starter = DevServerStarter::new(&settings.server, project.cwd());

    let shutdown = if config.create_ctrlc_handler {
        shutdown_receiver()
    } else {
        crossbeam_channel::never()
    };

    execute(settings, &specs, &launcher, &starter, &shutdown, printer)
}

/// The instances a run would start, without starting anything.
///
/// When no URL is configured, instances are planned against the URL the dev server would bind.
pub fn plan_run(project: &Project) -> Result<Vec<InstancePlan>> {
    let settings = project.settings();
    let specs = project.collect_specs()?;

    let urls = settings
        .url
        .as_deref()
        .and_then(TargetUrls::parse)
        .unwrap_or_else(|| {
            TargetUrls::single(DevServerStarter::new(&settings.server, project.cwd()).url())
        });

    Ok(plan_instances(settings, &specs, &urls))
}

/// Run `specs` with the given launcher and server starter until every instance has finished or
/// `shutdown` yields a signal number.
///
/// A signal that arrives while the dev server starts or while instances are launched stops the
/// run before any further instance is started.
pub fn execute<L: Launcher>(
    settings: &Settings,
    specs: &[String],
    launcher: &L,
    starter: &dyn ServerStarter,
    shutdown: &Receiver<i32>,
    printer: Printer,
) -> Result<RunOutcome> {
    anyhow::ensure!(!specs.is_empty(), "No spec files to run");

    let (urls, server) = match settings.url.as_deref().and_then(TargetUrls::parse) {
        Some(urls) => (urls, None),
        None => {
            let server = starter.start(settings.mode)?;
            (TargetUrls::single(server.url()), Some(server))
        }
    };

    let plans = plan_instances(settings, specs, &urls);

    let mut supervisor = Supervisor::new(server, settings.runner.grace_period, printer);
    for plan in &plans {
        if let Ok(signal) = shutdown.try_recv() {
            return Ok(supervisor.interrupt(signal));
        }
        supervisor.launch(launcher, plan);
    }

    Ok(supervisor.wait(shutdown))
}

struct Instance<P> {
    ordinal: usize,
    base_url: String,
    process: P,
}

impl<P> Instance<P> {
    /// One-based, as shown to users.
    const fn number(&self) -> usize {
        self.ordinal + 1
    }
}

/// Owns the live runner instances and the optional dev server for the length of a run.
///
/// Dropping the supervisor tears the run down, so an error or panic in the parent still stops
/// every instance and closes the server.
pub struct Supervisor<P: RunnerProcess> {
    live: Vec<Instance<P>>,
    aggregate_exit_code: Option<i32>,
    server: Option<Box<dyn AuxiliaryServer>>,
    torn_down: bool,
    grace_period: Duration,
    printer: Printer,
}

impl<P: RunnerProcess> Supervisor<P> {
    pub fn new(
        server: Option<Box<dyn AuxiliaryServer>>,
        grace_period: Duration,
        printer: Printer,
    ) -> Self {
        Self {
            live: Vec::new(),
            aggregate_exit_code: None,
            server,
            torn_down: false,
            grace_period,
            printer,
        }
    }

    pub fn launch<L: Launcher<Process = P>>(&mut self, launcher: &L, plan: &InstancePlan) {
        let mut stdout = self.printer.stream_for_progress();
        let _ = writeln!(
            stdout,
            "{} runner instance {} with baseUrl {} ({} specs)",
            "Starting".cyan().bold(),
            plan.ordinal + 1,
            plan.base_url,
            plan.specs.len()
        );

        let process = launcher.launch(plan);

        self.live.push(Instance {
            ordinal: plan.ordinal,
            base_url: plan.base_url.clone(),
            process,
        });
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// The exit code of the first instance that reported one.
    pub const fn aggregate_exit_code(&self) -> Option<i32> {
        self.aggregate_exit_code
    }

    /// Poll every live instance once and handle whatever finished, in order.
    ///
    /// Returns `true` once no instance is left.
    pub fn reap(&mut self) -> bool {
        let mut index = 0;

        while index < self.live.len() {
            match self.live[index].process.poll() {
                Some(event) => {
                    let instance = self.live.remove(index);
                    self.record(&instance, event);
                }
                None => index += 1,
            }
        }

        self.live.is_empty()
    }

    fn record(&mut self, instance: &Instance<P>, event: InstanceEvent) {
        let mut stdout = self.printer.stream_for_progress();

        match event {
            InstanceEvent::Exited(code) => {
                let recorded = self.aggregate_exit_code.is_none();
                if recorded {
                    self.aggregate_exit_code = Some(code);
                }

                tracing::debug!(
                    instance = instance.number(),
                    code,
                    recorded,
                    "Runner instance exited"
                );

                if code == 0 {
                    let _ = writeln!(
                        stdout,
                        "{} runner instance {} with baseUrl {}",
                        "Finished".green().bold(),
                        instance.number(),
                        instance.base_url
                    );
                } else {
                    let _ = writeln!(
                        stdout,
                        "{} runner instance {} with baseUrl {} (exit code {code})",
                        "Failed".red().bold(),
                        instance.number(),
                        instance.base_url
                    );
                }
            }
            InstanceEvent::Errored(message) => {
                let recorded = self.aggregate_exit_code.is_none();
                if recorded {
                    self.aggregate_exit_code = Some(FAILURE_EXIT_CODE);
                }

                tracing::debug!(
                    instance = instance.number(),
                    recorded,
                    "Runner instance errored without an exit code"
                );

                let _ = writeln!(
                    stdout,
                    "{} runner instance {} with baseUrl {}: {message}",
                    "Failed".red().bold(),
                    instance.number(),
                    instance.base_url
                );
            }
        }
    }

    /// Process instance events until the pool is empty or `shutdown` fires.
    pub fn wait(mut self, shutdown: &Receiver<i32>) -> RunOutcome {
        loop {
            crossbeam_channel::select! {
                recv(shutdown) -> signal => {
                    if let Ok(signal) = signal {
                        return self.interrupt(signal);
                    }
                    // The sender is gone, so no interrupt can arrive anymore.
                    std::thread::sleep(INSTANCE_POLL_INTERVAL);
                },
                default(INSTANCE_POLL_INTERVAL) => {}
            }

            if self.reap() {
                break;
            }
        }

        self.teardown();

        let exit_code = self.aggregate_exit_code.unwrap_or(FAILURE_EXIT_CODE);
        tracing::debug!(exit_code, "All runner instances finished");

        RunOutcome::Completed { exit_code }
    }

    /// Stop everything because the parent received `signal`.
    pub fn interrupt(&mut self, signal: i32) -> RunOutcome {
        let exit_code = interrupted_exit_code(signal);
        tracing::debug!(signal, exit_code, "Shutting the run down");

        let mut stdout = self.printer.stream_for_failure_summary();
        let _ = writeln!(
            stdout,
            "{} with code {exit_code}, stopping {} runner instance(s)",
            "Parent process exiting".yellow().bold(),
            self.live.len()
        );
        drop(stdout);

        self.teardown();

        RunOutcome::Interrupted { exit_code }
    }

    /// Close the server and stop any live instance. Runs at most once.
    fn teardown(&mut self) {
        if std::mem::replace(&mut self.torn_down, true) {
            return;
        }

        if let Some(mut server) = self.server.take() {
            if let Err(err) = server.close() {
                tracing::warn!("Failed to close the dev server: {err:#}");
            }
        }

        self.stop_live();
    }

    /// Ask every live instance to stop, then kill whatever outlives the grace period.
    fn stop_live(&mut self) {
        if self.live.is_empty() {
            return;
        }

        for instance in &mut self.live {
            tracing::debug!(instance = instance.number(), "Requesting runner instance stop");
            instance.process.request_stop();
        }

        let deadline = Instant::now() + self.grace_period;

        loop {
            self.live.retain_mut(|instance| match instance.process.poll() {
                Some(event) => {
                    tracing::debug!(instance = instance.number(), ?event, "Runner instance stopped");
                    false
                }
                None => true,
            });

            if self.live.is_empty() || Instant::now() >= deadline {
                break;
            }

            std::thread::sleep(STOP_POLL_INTERVAL);
        }

        for mut instance in self.live.drain(..) {
            tracing::warn!(
                instance = instance.number(),
                "Runner instance did not stop within {}ms, killing it",
                self.grace_period.as_millis()
            );
            instance.process.force_kill();
        }
    }
}

impl<P: RunnerProcess> Drop for Supervisor<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
