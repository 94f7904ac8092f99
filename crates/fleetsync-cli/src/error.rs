//! Error types for the command-line tool.

use fleetsync_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid hex frame: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("{0} frame(s) could not be decoded")]
    DecodeFailures(usize),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
