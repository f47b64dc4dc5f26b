use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{fmt, EnvFilter};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise DEBUG if `debug` is true, else WARN so
/// the progress bar and status lines stay readable. Logs go to stderr to keep
/// `--json` output on stdout clean.
pub fn init(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::SystemTime)
        .with_level(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Set the global verbose mode flag.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::SeqCst);
}

/// Check whether verbose mode is currently enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_set_and_get() {
        // Single test: the flag is process-global and tests run in parallel.
        set_verbose(true);
        assert!(is_verbose());

        set_verbose(false);
        assert!(!is_verbose());
    }
}
