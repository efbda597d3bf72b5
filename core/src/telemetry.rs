// Logging setup shared by the binaries
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "info,contoso_core=info,voice_agent=info";

/// Install the fmt subscriber, filtered by `RUST_LOG` or `default_filter`.
///
/// Calling it twice is harmless; the second call keeps the first subscriber.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
