use tracing_subscriber::EnvFilter;

/// Initialise logging to stderr.
///
/// Without `--debug` the level is fixed at `info`. With it, `RUST_LOG`
/// overrides the `debug` default.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
