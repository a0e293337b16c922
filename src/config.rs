//! Configuration management
//!
//! User preferences are loaded once at startup from an INI file and stay
//! read-only for the rest of the process, except through explicit
//! `set` + `save` calls.

use crate::{LeitorError, Result};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Speech defaults handed to the speaker at startup
///
/// Per-call options are merged over these field-by-field; an explicit
/// option always wins.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechDefaults {
    /// Speech rate (0.1 to 10, 1.0 is normal)
    pub rate: f32,
    /// Speech pitch (0 to 2, 1.0 is normal)
    pub pitch: f32,
    /// Speech volume (0 to 1)
    pub volume: f32,
    /// Preferred language code, e.g. "pt-BR"
    pub language: String,
}

/// User preferences for the reader
///
/// Manages speech defaults (rate, pitch, volume, language) and UI
/// behaviour toggles (notifications, auto-stop on a new selection).
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.leitor.cfg)
    path: PathBuf,
}

impl Config {
    /// Load configuration from disk or create default
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path (used by tests)
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| LeitorError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| LeitorError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| LeitorError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.leitor.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".leitor.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("rate", "1.0")
            .set("pitch", "1.0")
            .set("volume", "1.0")
            .set("language", "pt-BR");

        ini.with_section(Some("ui"))
            .set("show_notifications", "true")
            .set("auto_stop_on_new_selection", "true");

        ini
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get a float value from config
    pub fn get_float(&self, section: &str, key: &str, default: f32) -> f32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    // Reader-specific configuration getters

    /// Default speech rate (1.0 is normal)
    pub fn default_rate(&self) -> f32 {
        self.get_float("speech", "rate", 1.0)
    }

    /// Default speech pitch (1.0 is normal)
    pub fn default_pitch(&self) -> f32 {
        self.get_float("speech", "pitch", 1.0)
    }

    /// Default speech volume (0.0 to 1.0)
    pub fn default_volume(&self) -> f32 {
        self.get_float("speech", "volume", 1.0)
    }

    /// Preferred voice language
    pub fn preferred_language(&self) -> String {
        self.get_string("speech", "language", "pt-BR")
    }

    /// Should errors raise a user-visible notification?
    pub fn show_notifications(&self) -> bool {
        self.get_bool("ui", "show_notifications", true)
    }

    /// Should a speak command on a new selection pre-empt active speech?
    /// When false, speak clicks are ignored while a session is active.
    pub fn auto_stop_on_new_selection(&self) -> bool {
        self.get_bool("ui", "auto_stop_on_new_selection", true)
    }

    /// Snapshot of the speech defaults for the speaker
    pub fn speech_defaults(&self) -> SpeechDefaults {
        SpeechDefaults {
            rate: self.default_rate(),
            pitch: self.default_pitch(),
            volume: self.default_volume(),
            language: self.preferred_language(),
        }
    }
}
