//! Error types for leitor

use std::io;
use thiserror::Error;

/// Main error type for leitor
#[derive(Error, Debug)]
pub enum LeitorError {
    /// A command arrived in a state that cannot accept it
    /// (e.g., pause with nothing speaking). Non-fatal; reported
    /// back to the coordinator as an error status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The synthesizer cannot provide a required capability
    /// (e.g., no speech engine on this system, pause unsupported).
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for leitor operations
pub type Result<T> = std::result::Result<T, LeitorError>;

impl From<String> for LeitorError {
    fn from(s: String) -> Self {
        LeitorError::Other(s)
    }
}

impl From<&str> for LeitorError {
    fn from(s: &str) -> Self {
        LeitorError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for LeitorError {
    fn from(e: serde_json::Error) -> Self {
        LeitorError::Other(format!("JSON error: {}", e))
    }
}
