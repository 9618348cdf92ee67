mod printer;
mod subscriber;

pub use printer::{Printer, Stdout};
pub use subscriber::{TracingGuard, setup_tracing};

use tracing_subscriber::filter::LevelFilter;

/// How much output the user asked for via `-q`/`-v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    /// Only failures and the final summary (`-q`).
    Quiet,

    /// Progress lines and warnings.
    #[default]
    Default,

    /// Informational tracing output (`-v`).
    Verbose,

    /// Debug tracing output (`-vv`).
    ExtraVerbose,

    /// Everything, rendered as a tree (`-vvv`).
    Trace,
}

impl VerbosityLevel {
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::ERROR,
            Self::Default => LevelFilter::WARN,
            Self::Verbose => LevelFilter::INFO,
            Self::ExtraVerbose => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    pub const fn is_trace(self) -> bool {
        matches!(self, Self::Trace)
    }
}

/// Control when colored output is used.
#[derive(
    Copy, Clone, Hash, Debug, PartialEq, Eq, PartialOrd, Ord, Default, clap::ValueEnum, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalColor {
    /// Display colors if the output goes to an interactive terminal.
    #[default]
    Auto,

    /// Always display colors.
    Always,

    /// Never display colors.
    Never,
}

/// Force `colored` on or off when the user asked for it explicitly.
pub fn set_colored_override(color: Option<TerminalColor>) {
    let Some(color) = color else {
        return;
    };

    match color {
        TerminalColor::Auto => colored::control::unset_override(),
        TerminalColor::Always => colored::control::set_override(true),
        TerminalColor::Never => colored::control::set_override(false),
    }
}
