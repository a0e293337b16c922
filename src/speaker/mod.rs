//! Utterance execution
//!
//! The speaker runs in the surface's context, owns the synthesizer
//! handle and executes commands from the coordinator. At most one
//! utterance is ever active; a new speak pre-empts whatever is in
//! flight. Outcomes travel back as status messages; command failures
//! are reported the same way and never propagate.

pub mod backends;
pub mod synth;

pub use synth::{create_synth, EngineEvent, Synthesizer, UtteranceRequest, UtteranceTag, Voice};

use crate::config::SpeechDefaults;
use crate::message::{Command, SpeakOptions, Status};
use crate::{LeitorError, Result};
use crossbeam_channel::Sender;
use log::{debug, info, warn};

/// Speech command executor
pub struct Speaker {
    /// Platform synthesizer
    synth: Box<dyn Synthesizer>,

    /// Configured defaults merged under per-call options
    defaults: SpeechDefaults,

    /// Status channel back to the coordinator
    status: Sender<Status>,

    /// The in-flight utterance, if any
    current: Option<(UtteranceTag, UtteranceRequest)>,

    /// Whether the in-flight utterance is paused
    paused: bool,
}

impl Speaker {
    pub fn new(
        synth: Box<dyn Synthesizer>,
        defaults: SpeechDefaults,
        status: Sender<Status>,
    ) -> Self {
        Self {
            synth,
            defaults,
            status,
            current: None,
            paused: false,
        }
    }

    /// Whether an utterance is active (possibly paused)
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Whether the active utterance is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Text of the in-flight utterance
    pub fn current_text(&self) -> Option<&str> {
        self.current.as_ref().map(|(_, req)| req.text.as_str())
    }

    /// Replace the configured defaults (explicit preference update)
    pub fn update_defaults(&mut self, defaults: SpeechDefaults) {
        info!("Speech defaults updated: {:?}", defaults);
        self.defaults = defaults;
    }

    /// Execute one command from the coordinator
    ///
    /// Failures are reported back as an error status, never thrown.
    pub fn handle_command(&mut self, command: Command) {
        debug!("Received command: {:?}", command);
        let result = match command {
            Command::Speak { text, options } => self.exec_speak(text, options),
            Command::Stop => self.exec_stop(),
            Command::Pause => self.exec_pause(),
            Command::Resume => self.exec_resume(),
        };
        if let Err(e) = result {
            warn!("Command failed: {}", e);
            self.emit(Status::Error {
                error: e.to_string(),
            });
        }
    }

    /// Map an engine event for the current utterance to a status
    ///
    /// Events carrying the tag of a pre-empted or already-cleared
    /// utterance are dropped; this is what keeps a cancelled
    /// utterance's tail events from disturbing the new session.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        let current = self.current.as_ref().map(|(tag, _)| *tag);
        match event {
            EngineEvent::Started(tag) if Some(tag) == current => {
                // Started was already reported when the command ran
                debug!("Engine confirmed start of {:?}", tag);
            }
            EngineEvent::Finished(tag) if Some(tag) == current => {
                debug!("Utterance {:?} finished", tag);
                self.clear();
                self.emit(Status::Finished);
            }
            EngineEvent::Stopped(tag) if Some(tag) == current => {
                debug!("Utterance {:?} stopped by the engine", tag);
                self.clear();
                self.emit(Status::Stopped);
            }
            EngineEvent::Failed { utterance, message } if Some(utterance) == current => {
                warn!("Utterance {:?} failed: {}", utterance, message);
                self.clear();
                self.emit(Status::Error { error: message });
            }
            other => debug!("Dropping stale engine event: {:?}", other),
        }
    }

    /// The surface went hidden: pause active speech, best-effort
    pub fn page_hidden(&mut self) {
        if self.current.is_some() && !self.paused {
            debug!("Page hidden, pausing speech");
            match self.synth.pause() {
                Ok(()) => {
                    self.paused = true;
                    self.emit(Status::Paused);
                }
                Err(e) => debug!("Pause on hide failed: {}", e),
            }
        }
    }

    /// The surface became visible again: resume paused speech
    pub fn page_visible(&mut self) {
        if self.current.is_some() && self.paused {
            debug!("Page visible, resuming speech");
            match self.synth.resume() {
                Ok(()) => {
                    self.paused = false;
                    self.emit(Status::Resumed);
                }
                Err(e) => debug!("Resume on show failed: {}", e),
            }
        }
    }

    /// The surface is unloading: cancel everything, best-effort
    ///
    /// No status is sent; the channel is torn down with the surface and
    /// the coordinator's lifecycle listeners handle the reset.
    pub fn unload(&mut self) {
        if self.current.is_some() {
            debug!("Page unloading, canceling speech");
        }
        if let Err(e) = self.synth.cancel() {
            debug!("Cancel on unload failed: {}", e);
        }
        self.clear();
    }

    fn exec_speak(&mut self, text: String, options: Option<SpeakOptions>) -> Result<()> {
        if text.is_empty() {
            return Err(LeitorError::InvalidState("no text to speak".to_string()));
        }

        // Pre-empt: a new speak always cancels what is in flight.
        if self.current.is_some() {
            debug!("Pre-empting active utterance");
            self.synth.cancel()?;
            self.clear();
        }

        let request = self.build_request(text, options.unwrap_or_default());
        let tag = self.synth.speak(&request)?;
        debug!("Started speaking ({:?}): {:.50}", tag, request.text);

        self.current = Some((tag, request));
        self.paused = false;
        self.emit(Status::Started);
        Ok(())
    }

    fn exec_stop(&mut self) -> Result<()> {
        if self.current.is_some() {
            self.synth.cancel()?;
        } else {
            // Idempotent: nothing active, cancel only as a courtesy
            debug!("Stop with nothing active");
            if let Err(e) = self.synth.cancel() {
                debug!("Cancel while idle failed: {}", e);
            }
        }
        self.clear();
        self.emit(Status::Stopped);
        Ok(())
    }

    fn exec_pause(&mut self) -> Result<()> {
        if self.current.is_none() {
            return Err(LeitorError::InvalidState("no speech to pause".to_string()));
        }
        if self.paused {
            return Err(LeitorError::InvalidState(
                "speech already paused".to_string(),
            ));
        }
        self.synth.pause()?;
        self.paused = true;
        self.emit(Status::Paused);
        Ok(())
    }

    fn exec_resume(&mut self) -> Result<()> {
        if !self.paused {
            return Err(LeitorError::InvalidState("no speech to resume".to_string()));
        }
        self.synth.resume()?;
        self.paused = false;
        self.emit(Status::Resumed);
        Ok(())
    }

    /// Merge per-call options over the defaults and pick a voice
    fn build_request(&mut self, text: String, options: SpeakOptions) -> UtteranceRequest {
        let language = options
            .language
            .unwrap_or_else(|| self.defaults.language.clone());
        let voice = self.select_voice(&language, options.voice.as_deref());

        UtteranceRequest {
            text,
            rate: options.rate.unwrap_or(self.defaults.rate),
            pitch: options.pitch.unwrap_or(self.defaults.pitch),
            volume: options.volume.unwrap_or(self.defaults.volume),
            language,
            voice,
        }
    }

    /// Three-tier voice preference: language match, then the engine's
    /// default voice, then the first voice offered. An explicit voice
    /// option short-circuits the tiers.
    fn select_voice(&mut self, language: &str, explicit: Option<&str>) -> Option<Voice> {
        let voices = match self.synth.voices() {
            Ok(v) => v,
            Err(e) => {
                debug!("Voice enumeration failed: {}", e);
                return None;
            }
        };
        if voices.is_empty() {
            return None;
        }

        if let Some(wanted) = explicit {
            if let Some(voice) = voices.iter().find(|v| v.name == wanted || v.id == wanted) {
                return Some(voice.clone());
            }
            warn!("Requested voice {:?} not found, falling back", wanted);
        }

        voices
            .iter()
            .find(|v| v.language.starts_with(language))
            .or_else(|| voices.iter().find(|v| v.default))
            .or_else(|| voices.first())
            .cloned()
    }

    fn clear(&mut self) {
        self.current = None;
        self.paused = false;
    }

    fn emit(&self, status: Status) {
        if self.status.send(status).is_err() {
            warn!("Status channel closed, coordinator gone");
        }
    }
}
