//! Structured logging setup for the binary

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";
const VERBOSE_FILTER: &str = "debug";

/// Install a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `info` (or `debug` when `verbose`). A second call is a no-op.
pub fn init(verbose: bool) {
  let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

  let _ = tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
    .try_init();
}
