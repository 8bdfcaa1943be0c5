use tracing_subscriber::EnvFilter;

/// Installs the global stderr subscriber.
///
/// The filter comes from `RUST_LOG`, then `SAW_RANKER_LOG`, then `info`.
/// Calling this twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("SAW_RANKER_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
