//! Configuration error types.
//!
//! The simulation itself has no recoverable failures: a weapon that cannot
//! fire reports `None`, and a dangling entity handle reads as "no entity".
//! Only round setup can fail, when a config file is unreadable or holds
//! values the simulation cannot run with.

use std::fmt;
use std::path::PathBuf;

/// Error loading or validating a [`crate::SimConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config text is not valid JSON for `SimConfig`.
    Parse(serde_json::Error),

    /// A value parsed fine but is outside its usable range.
    InvalidValue {
        /// Name of the field (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the constraint.
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "malformed config: {err}"),
            Self::InvalidValue {
                name,
                value,
                reason,
            } => write!(f, "invalid config value {name}={value}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}
