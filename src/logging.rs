//! Log setup for the binary and for embedders that want the same output.
//!
//! Events go to stderr so stdout stays clean for JSON and context output.
//! `RUST_LOG` takes precedence over the configured filter:
//!
//! ```bash
//! RUST_LOG=debug code-context watch .
//! RUST_LOG=code_context::watcher=trace code-context watch .
//! ```

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Install the global subscriber. Only the first call takes effect.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(config.directives())
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_filter(filter);

        // A host application may already own the global subscriber.
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}
