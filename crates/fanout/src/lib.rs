use std::ffi::OsString;
use std::fmt::Write;
use std::io;
use std::process::{ExitCode, Termination};
use std::time::Instant;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use colored::Colorize;
use fanout_cli::{Args, Command, RunCommand, TermPrompter, gather_answers};
use fanout_logging::{Printer, set_colored_override, setup_tracing};
use fanout_metadata::{ProjectMetadata, ProjectOptionsOverrides};
use fanout_project::Project;
use fanout_project::path::absolute;
use fanout_runner::{InstancePlan, ParallelRunConfig, RunOutcome};

mod version;

pub fn fanout_main(f: impl FnOnce(Vec<OsString>) -> Vec<OsString>) -> ExitStatus {
    run(f).unwrap_or_else(|error| {
        use std::io::Write;

        let mut stderr = std::io::stderr().lock();

        writeln!(stderr, "{}", "fanout failed".red().bold()).ok();
        for cause in error.chain() {
            if let Some(ioerr) = cause.downcast_ref::<io::Error>() {
                if ioerr.kind() == io::ErrorKind::BrokenPipe {
                    return ExitStatus::Success;
                }
            }

            writeln!(stderr, "  {} {cause}", "Cause:".bold()).ok();
        }

        ExitStatus::Error
    })
}

fn run(f: impl FnOnce(Vec<OsString>) -> Vec<OsString>) -> anyhow::Result<ExitStatus> {
    let args = wild::args_os();

    let args = f(
        argfile::expand_args_from(args, argfile::parse_fromfile, argfile::PREFIX)
            .context("Failed to read CLI arguments from file")?,
    );

    let args = Args::parse_from(args);

    match args.command {
        Command::Run(run_args) => run_specs(run_args),
        Command::Wizard => wizard(),
        Command::Version => version().map(|()| ExitStatus::Success),
    }
}

pub(crate) fn version() -> Result<()> {
    let mut stdout = Printer::default().stream_for_requested_summary().lock();
    writeln!(stdout, "fanout {}", crate::version::version())?;
    Ok(())
}

/// Ask for the run options, then run as if they had been passed as flags.
pub(crate) fn wizard() -> Result<ExitStatus> {
    let answers = gather_answers(&mut TermPrompter::stderr())
        .context("Failed to read the wizard answers")?;

    let args = std::iter::once("fanout run".to_string()).chain(answers.to_args());
    let run_args = RunCommand::try_parse_from(args)?;

    run_specs(run_args)
}

pub(crate) fn run_specs(args: RunCommand) -> Result<ExitStatus> {
    let verbosity = args.verbosity().level();

    let cli_color = args.color;
    set_colored_override(cli_color);

    let _guard = setup_tracing(verbosity);

    let cwd = {
        let cwd = std::env::current_dir().context("Failed to get the current working directory")?;
        Utf8PathBuf::from_path_buf(cwd).map_err(|path| {
            anyhow::anyhow!(
                "The current working directory `{}` contains non-Unicode characters. fanout only supports Unicode paths.",
                path.display()
            )
        })?
    };

    tracing::debug!(cwd = %cwd, "Working directory");

    let config_file = args.config_file.as_ref().map(|path| absolute(path, &cwd));

    let mut project_metadata = if let Some(config_file) = config_file {
        ProjectMetadata::from_config_file(config_file)?
    } else {
        ProjectMetadata::discover(&cwd)?
    };

    let dry_run = args.dry_run;

    let project_options_overrides = ProjectOptionsOverrides::new(args.into_options());
    project_metadata.apply_overrides(&project_options_overrides);

    let project = Project::from_metadata(cwd, project_metadata);
    let settings = project.settings();

    if let Some(config_file) = project.metadata().config_file() {
        tracing::info!(path = %config_file, "Using configuration file");
    }

    if cli_color.is_none() {
        set_colored_override(settings.terminal.color);
    }

    let printer = Printer::new(verbosity, settings.terminal.no_progress);

    if dry_run {
        let plans = fanout_runner::plan_run(&project)?;
        print_plan(printer, &plans)?;
        return Ok(ExitStatus::Success);
    }

    let config = ParallelRunConfig {
        create_ctrlc_handler: true,
    };

    let start_time = Instant::now();

    let outcome = fanout_runner::run_parallel(&project, &config, printer)?;

    print_summary(printer, start_time, outcome)?;

    Ok(ExitStatus::from(outcome))
}

/// Print the instances a run would start, for `--dry-run`.
fn print_plan(printer: Printer, plans: &[InstancePlan]) -> Result<()> {
    let mut stdout = printer.stream_for_requested_summary().lock();

    for plan in plans {
        writeln!(stdout, "<instance {}> {}", plan.ordinal + 1, plan.base_url)?;
        for spec in &plan.specs {
            writeln!(stdout, "  {spec}")?;
        }
    }

    if !plans.is_empty() {
        writeln!(stdout)?;
    }

    let spec_count: usize = plans.iter().map(|plan| plan.specs.len()).sum();
    writeln!(
        stdout,
        "{spec_count} specs across {} runner instances",
        plans.len()
    )?;

    Ok(())
}

fn print_summary(printer: Printer, start_time: Instant, outcome: RunOutcome) -> Result<()> {
    let RunOutcome::Completed { exit_code } = outcome else {
        return Ok(());
    };

    let mut stdout = printer.stream_for_failure_summary().lock();

    let status = if exit_code == 0 {
        "ok".green().bold()
    } else {
        "FAILED".red().bold()
    };

    writeln!(
        stdout,
        "\nrun result: {status}. exit code {exit_code}; finished in {:.2}s",
        start_time.elapsed().as_secs_f64()
    )?;

    Ok(())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every runner instance that reported succeeded.
    Success,

    /// The run failed.
    Failure,

    /// fanout itself failed, e.g. because of invalid configuration.
    Error,

    /// The exit code aggregated from the runner instances.
    Code(i32),
}

impl From<RunOutcome> for ExitStatus {
    fn from(outcome: RunOutcome) -> Self {
        match outcome.exit_code() {
            0 => Self::Success,
            1 => Self::Failure,
            code => Self::Code(code),
        }
    }
}

impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        match u8::try_from(self.to_i32()) {
            Ok(code) => ExitCode::from(code),
            Err(_) => ExitCode::FAILURE,
        }
    }
}

impl ExitStatus {
    pub const fn to_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Error => 2,
            Self::Code(code) => code,
        }
    }
}
