//! Aniflux error types

use std::path::PathBuf;

use thiserror::Error;

/// Failure raised by a peer while it handles an animator notification.
///
/// These never leave the callback forwarder: they are logged and cleared
/// there so the engine's dispatch loop keeps running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PeerError {
    /// The peer's handler threw (a pending exception in the managed runtime)
    #[error("peer raised an exception: {0}")]
    Exception(String),

    /// The calling thread could not be attached to the peer runtime
    #[error("peer runtime not attached to the current thread")]
    Detached,

    /// Any other peer-side failure
    #[error("peer error: {0}")]
    Other(String),
}

/// Result of delivering one notification to a peer
pub type PeerResult = std::result::Result<(), PeerError>;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for `AnimatorConfig`
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but holds an out-of-range value
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
