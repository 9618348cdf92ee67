/// Environment variables read or set by fanout.
pub struct EnvVars;

impl EnvVars {
    /// Path to a `fanout.toml` to use instead of the one in the working directory.
    pub const FANOUT_CONFIG_FILE: &'static str = "FANOUT_CONFIG_FILE";

    /// Test-runner executable, used when the configuration file doesn't name one.
    pub const FANOUT_RUNNER_BINARY: &'static str = "FANOUT_RUNNER_BINARY";

    /// Set on every runner instance to its zero-based ordinal.
    pub const FANOUT_INSTANCE_INDEX: &'static str = "FANOUT_INSTANCE_INDEX";
}
