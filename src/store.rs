//! Best-effort local persistence
//!
//! The last-known session is mirrored to a small JSON file after every
//! transition. It is a snapshot, not durable state: the coordinator
//! reads it once at startup for logging and otherwise always begins
//! idle. Callers treat every failure here as non-fatal.

use crate::coordinator::Session;
use crate::Result;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot storage backed by a JSON file
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Store at the default location (~/.leitor-session.json)
    pub fn new() -> Self {
        let path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".leitor-session.json");
        Self { path }
    }

    /// Store at a specific path (used by tests)
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write the session snapshot
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        debug!("Session snapshot written to {:?}", self.path);
        Ok(())
    }

    /// Read the last snapshot, if any
    pub fn load_session(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
