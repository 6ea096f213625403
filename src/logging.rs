//! Developer diagnostics
//!
//! Two output channels share stderr:
//!
//! - **Tracing (this module)**: filtered by `MODCOMMIT_LOG`, compact format,
//!   off below `warn` by default.
//! - **User progress (`ui`)**: colored status lines and the spinner.
//!
//! Stdout carries the output contract only.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the tracing filter directives
pub const LOG_ENV: &str = "MODCOMMIT_LOG";

/// Initialize the tracing subscriber
///
/// ```bash
/// MODCOMMIT_LOG=modcommit=debug modcommit generate --staged
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (tests, embedding hosts) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
