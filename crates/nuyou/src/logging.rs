//! Tracing setup.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the command's
//! default level (`debug` with `--verbose`). Configuration can raise the
//! level to `debug` after it is loaded (`APP_DEBUG`, `APP_ENV=development`),
//! which is why the filter sits behind a reload layer.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Handle to the installed subscriber's filter.
pub(crate) struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    locked: bool,
}

impl Logging {
    /// Install the global subscriber.
    pub(crate) fn init(verbose: bool, default_level: &str) -> Self {
        let from_env = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
        let filter = if verbose {
            EnvFilter::new("debug")
        } else if from_env {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(default_level)
        };

        let (filter, handle) = reload::Layer::new(filter);
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();

        Self {
            handle,
            locked: verbose || from_env,
        }
    }

    /// Switch to debug level unless the level was chosen explicitly.
    pub(crate) fn enable_debug(&self) {
        if self.locked {
            return;
        }
        if let Err(e) = self.handle.modify(|filter| *filter = EnvFilter::new("debug")) {
            tracing::warn!(error = %e, "Failed to enable debug logging");
        }
    }
}
