//! EngineGate error types

use thiserror::Error;

/// EngineGate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport error (connect, read, or protocol failure against the engine)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Security rejection (blocked command, invalid or expired token)
    #[error("Security error: {0}")]
    Security(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for EngineGate operations
pub type Result<T> = std::result::Result<T, Error>;
