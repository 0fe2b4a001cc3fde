//! Error types for configuration resolution.

use thiserror::Error;

/// Errors that can occur while resolving deployment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested environment selector matches no registry entry.
    ///
    /// The message enumerates the supported environment names so the caller
    /// can self-correct without consulting the source.
    #[error("Unknown environment \"{requested}\". Supported environments: {supported}.")]
    UnknownEnvironment {
        /// The selector exactly as the caller supplied it.
        requested: String,
        /// Comma-separated supported names, in stable sorted order.
        supported: String,
    },
}
