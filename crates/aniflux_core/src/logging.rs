//! Logging setup
//!
//! Everything in this workspace logs through `tracing`. Hosts that don't
//! install their own subscriber can call [`init_logging`] once at startup;
//! `RUST_LOG` overrides the filter passed in.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `filter`
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
