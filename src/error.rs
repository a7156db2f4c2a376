//! Error types for tweet context resolution.

use thiserror::Error;

/// Errors raised while querying the element tree.
///
/// These never cross the resolver boundary: strategies surface them as
/// faults, the resolver logs them and moves on to the next strategy.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A CSS selector (built-in or configured) failed to parse
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The navigation URL could not be parsed
    #[error("invalid navigation URL `{0}`")]
    InvalidUrl(String),
}

/// Errors that can occur while loading resolver configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed fine but is unusable (zero depth cap, empty list)
    #[error("invalid config: {0}")]
    Invalid(String),
}
