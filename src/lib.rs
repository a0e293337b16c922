//! Leitor - selection-to-speech reader
//!
//! Reads selected text aloud through the platform speech synthesizer,
//! driven by context-menu style commands (speak, stop, pause, resume).
//! A coordinator owns the session and menu state; a speaker owns the
//! synthesizer and executes commands sent over a message channel.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod message;
pub mod speaker;
pub mod store;

pub use error::{LeitorError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "leitor";
