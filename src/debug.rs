use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber. `--debug` raises the default level
/// from WARN to DEBUG; `RUST_LOG` takes precedence when set.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "watchfinder=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
