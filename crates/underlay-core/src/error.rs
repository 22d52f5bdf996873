//! Error types for the underlying DNS monitor
//!
//! Every error here is recoverable: the monitor degrades to
//! "no new information" instead of failing the hosting process.

use thiserror::Error;

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the underlying DNS monitor
#[derive(Error, Debug)]
pub enum Error {
    /// The external network-change subsystem could not be brought up
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// An interface index could not be translated into an identifier
    #[error("Lookup error for interface index {index}: {message}")]
    Lookup {
        /// The OS interface index that failed to resolve
        index: u32,
        /// Error message
        message: String,
    },

    /// A single configuration source could not be read
    #[error("Config read error ({interface} / {key}): {message}")]
    ConfigRead {
        /// Canonical interface identifier
        interface: String,
        /// Configuration key being read
        key: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an initialization error
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Create a lookup error
    pub fn lookup(index: u32, message: impl Into<String>) -> Self {
        Self::Lookup {
            index,
            message: message.into(),
        }
    }

    /// Create a config read error
    pub fn config_read(
        interface: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConfigRead {
            interface: interface.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this is an initialization failure
    pub fn is_initialization(&self) -> bool {
        matches!(self, Self::Initialization(_))
    }
}
