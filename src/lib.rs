pub mod app;
pub mod config;
mod error;
pub mod store;
pub mod web;

// re-exports
pub use app::{App, AppState};
pub use error::{Error, Result};
pub use store::SubmissionStore;
pub use web::serve;

use tracing_subscriber::EnvFilter;

/// Console logging for local development.
/// Respects `RUST_LOG`, falls back to debug output for this crate and `tower_http`.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("waitlist=debug,tower_http=debug")),
        )
        .compact()
        .init();
}

/// Logging for release builds: no ANSI colors, `info` unless `RUST_LOG` says otherwise.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
