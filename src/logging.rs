//! Tracing subscriber setup for the demo binary.

use tracing_subscriber::EnvFilter;

/// Overrides the verbosity flag when set, e.g. `TRAFFIC_LIGHT_LOG=traffic_light=debug`.
pub const ENV_LOG: &str = "TRAFFIC_LIGHT_LOG";

/// - 0 → `"warn"`
/// - 1 → `"info"`
/// - 2 → `"debug"`
/// - 3+ → `"trace"`
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs a stderr fmt subscriber. Safe to call more than once.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init();
}
