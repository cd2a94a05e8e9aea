//! Diagnostic logging.
//!
//! Structured `tracing` events written to stderr. Filter with `RUST_LOG`,
//! e.g. `RUST_LOG=faq_relay=debug` to see which passages each question
//! retrieved.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the process-wide diagnostic subscriber.
///
/// Logs go to stderr, leaving stdout for command output. The level defaults
/// to `info` and can be overridden with `RUST_LOG`.
pub fn init() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,serenity=warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
