//! upnp-cli - router port forwarding over UPnP
//!
//! This library finds the UPnP Internet Gateway Device on the local network,
//! settles on exactly one WAN connection service to talk to, and forwards or
//! clears ports on it for TCP and UDP together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod igd;
pub mod keep;
pub mod router;
pub mod settings;

#[cfg(test)]
mod tests;

/// Result type alias for upnp-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for upnp-cli operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}

/// Initialize logging to stderr
///
/// INFO and above by default, DEBUG and above when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
