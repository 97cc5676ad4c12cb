//! Log output for the CLI binary.
//!
//! The subscriber is installed before any endpoint is registered, so
//! registration events are visible. `--verbose` is only known after argument
//! parsing, so the filter sits behind a reload layer.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";
/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str = "debug";

/// Handle for adjusting the installed filter.
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Replaces the filter with [`VERBOSE_FILTER`], overriding `RUST_LOG`.
    pub fn set_verbose(&self) -> Result<(), reload::Error> {
        self.filter.reload(EnvFilter::new(VERBOSE_FILTER))
    }
}

/// Installs a `fmt` subscriber writing to stderr, filtered by `RUST_LOG`.
///
/// Calling this twice keeps the first subscriber; the returned handle then
/// fails to reload.
pub fn init_logging() -> LogHandle {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (filter, handle) = reload::Layer::new(filter);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();

    LogHandle { filter: handle }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_raises_level_after_install() {
        let handle = init_logging();
        handle.set_verbose().unwrap();
        assert!(tracing::enabled!(tracing::Level::DEBUG));
    }
}
