use std::fs::File;
use std::io::BufWriter;

use tracing_flame::{FlameLayer, FlushGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_tree::HierarchicalLayer;

use crate::VerbosityLevel;

/// Overrides the verbosity-derived filter, e.g. `FANOUT_LOG=fanout_runner=trace`.
const LOG_ENV: &str = "FANOUT_LOG";

/// When set, span timings are written to this file in folded-stack format.
const PROFILE_ENV: &str = "FANOUT_LOG_PROFILE";

/// Keeps the profiling output flushed until the process exits.
#[must_use]
pub struct TracingGuard {
    _flame: Option<FlushGuard<BufWriter<File>>>,
}

struct WallClock;

impl FormatTime for WallClock {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Install the global subscriber. Calling this twice keeps the first subscriber.
pub fn setup_tracing(level: VerbosityLevel) -> TracingGuard {
    let filter = EnvFilter::builder()
        .with_default_directive(level.level_filter().into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let (flame_layer, flame_guard) = match std::env::var_os(PROFILE_ENV) {
        Some(path) => match FlameLayer::with_file(&path) {
            Ok((layer, guard)) => (Some(layer), Some(guard)),
            Err(err) => {
                eprintln!("Failed to create profile file {}: {err}", path.to_string_lossy());
                (None, None)
            }
        },
        None => (None, None),
    };

    let (tree_layer, fmt_layer) = if level.is_trace() {
        let tree = HierarchicalLayer::default()
            .with_indent_lines(true)
            .with_indent_amount(2)
            .with_bracketed_fields(true)
            .with_targets(true)
            .with_writer(std::io::stderr);
        (Some(tree), None)
    } else {
        let fmt = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(WallClock)
            .with_target(level >= VerbosityLevel::ExtraVerbose);
        (None, Some(fmt))
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(tree_layer)
        .with(flame_layer)
        .try_init();

    TracingGuard {
        _flame: flame_guard,
    }
}
