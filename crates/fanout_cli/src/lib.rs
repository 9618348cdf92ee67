use camino::Utf8PathBuf;
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use fanout_logging::{TerminalColor, VerbosityLevel};
use fanout_metadata::{EnvVars, Options, RunnerOptions, TerminalOptions, ThreadCount};

mod passthrough;
mod wizard;

pub use passthrough::{RESERVED_FLAGS, strip_reserved_args};
pub use wizard::{Prompter, TermPrompter, WizardAnswers, gather_answers};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

const RUN_AFTER_HELP: &str = "All test-runner CLI options are also supported after `--`:\n\
    https://docs.cypress.io/guides/guides/command-line.html#cypress-run";

#[derive(clap::Args, Debug, Clone, Default)]
#[command(about = None, long_about = None)]
pub struct Verbosity {
    #[arg(
        long,
        short = 'v',
        help = "Use verbose output (or `-vv` and `-vvv` for more verbose output)",
        action = clap::ArgAction::Count,
        global = true,
        overrides_with = "quiet",
    )]
    verbose: u8,

    #[arg(
        long,
        short,
        help = "Use quiet output",
        action = clap::ArgAction::Count,
        global = true,
        overrides_with = "verbose",
    )]
    quiet: u8,
}

impl Verbosity {
    /// Returns the verbosity level based on the number of `-v` and `-q` flags.
    pub const fn level(&self) -> VerbosityLevel {
        // `--quiet` and `--verbose` are mutually exclusive in Clap, so we can just check one first.
        match self.quiet {
            0 => {}
            _ => return VerbosityLevel::Quiet,
        }

        match self.verbose {
            0 => VerbosityLevel::Default,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::ExtraVerbose,
            _ => VerbosityLevel::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    name = "fanout",
    about = "Run end-to-end test specs across parallel test-runner processes."
)]
#[command(version)]
#[command(styles = STYLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Split the spec files into groups and run each group in its own test-runner process.
    Run(RunCommand),

    /// Ask for the run options interactively, then run.
    Wizard,

    /// Display fanout's version
    Version,
}

#[derive(Debug, Parser, Clone, Default)]
#[command(after_help = RUN_AFTER_HELP)]
pub struct RunCommand {
    /// Run in headless mode without the test runner's GUI.
    #[clap(long, default_missing_value = "true", num_args = 0..1)]
    pub headless: Option<bool>,

    /// The mode the dev server should run in [default: production].
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Run against the given URL, or comma-separated URLs, instead of starting the dev server.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Comma-separated `key=value` overrides for the test runner's configuration.
    #[arg(long, value_name = "KEY=VALUE")]
    pub config: Option<String>,

    /// Glob pattern selecting the spec files to run.
    #[arg(short = 's', long, value_name = "GLOB")]
    pub spec: Option<String>,

    /// Number of test-runner processes to start [default: 2].
    #[arg(short = 't', long)]
    pub threads: Option<ThreadCount>,

    /// The path to a `fanout.toml` file to use for configuration.
    #[arg(long, env = EnvVars::FANOUT_CONFIG_FILE, value_name = "PATH")]
    pub config_file: Option<Utf8PathBuf>,

    /// Print how the specs would be split without starting anything.
    #[clap(long)]
    pub dry_run: bool,

    /// Hide the per-instance progress lines.
    #[clap(long, default_missing_value = "true", num_args = 0..1)]
    pub no_progress: Option<bool>,

    /// Control when colored output is used.
    #[arg(long)]
    pub color: Option<TerminalColor>,

    #[clap(flatten)]
    pub verbosity: Verbosity,

    /// Arguments forwarded to every test-runner process.
    #[arg(last = true, value_name = "RUNNER_ARGS")]
    pub runner_args: Vec<String>,
}

impl RunCommand {
    pub const fn verbosity(&self) -> &Verbosity {
        &self.verbosity
    }

    pub fn into_options(self) -> Options {
        let config = self.config.map(|config| split_list(&config));
        let forwarded = strip_reserved_args(self.runner_args);

        Options {
            spec: self.spec,
            threads: self.threads,
            mode: self.mode.map(Into::into),
            headless: self.headless,
            url: self.url,
            runner: Some(RunnerOptions {
                binary: None,
                config,
                args: (!forwarded.is_empty()).then_some(forwarded),
                grace_period_ms: None,
            }),
            server: None,
            terminal: Some(TerminalOptions {
                color: self.color,
                no_progress: self.no_progress,
            }),
        }
    }
}

/// The mode the dev server runs in.
#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    #[value(name = "development")]
    Development,

    #[value(name = "production")]
    Production,

    #[value(name = "test")]
    Test,
}

impl From<Mode> for fanout_metadata::Mode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Development => Self::Development,
            Mode::Production => Self::Production,
            Mode::Test => Self::Test,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}
