//! Native TTS backend using the tts crate
//!
//! The `tts` crate provides a unified interface to Speech Dispatcher on
//! Linux, AVFoundation on macOS/iOS and SAPI/WinRT on Windows. Engine
//! callbacks are translated into tagged [`EngineEvent`]s; events for an
//! utterance the engine no longer tracks are simply not produced.

use crate::speaker::synth::{EngineEvent, Synthesizer, UtteranceRequest, UtteranceTag, Voice};
use crate::{LeitorError, Result};
use crossbeam_channel::Sender;
use log::{debug, warn};
use std::sync::{Arc, Mutex};
use tts::{Tts as TtsCrate, UtteranceId};

/// Utterances kept for callback correlation; the engine rarely has more
/// than one in flight since speak always pre-empts.
const PENDING_LIMIT: usize = 8;

type PendingMap = Arc<Mutex<Vec<(UtteranceId, UtteranceTag)>>>;

/// Native TTS backend
pub struct NativeSynth {
    /// The tts crate's TTS instance
    tts: TtsCrate,

    /// Engine event channel shared with the callbacks
    events: Sender<EngineEvent>,

    /// Utterance id -> tag correlation for callbacks
    pending: PendingMap,

    /// Next utterance tag
    next_tag: u64,
}

impl NativeSynth {
    /// Create a native TTS synthesizer forwarding events to `events`
    pub fn new(events: Sender<EngineEvent>) -> Result<Self> {
        debug!("Creating native TTS backend");

        let mut tts = TtsCrate::default()
            .map_err(|e| LeitorError::Synthesis(format!("Failed to initialize TTS: {}", e)))?;

        let pending: PendingMap = Arc::new(Mutex::new(Vec::new()));

        let features = tts.supported_features();
        if features.utterance_callbacks {
            Self::register_callbacks(&mut tts, &events, &pending)?;
        } else {
            warn!("Utterance callbacks not supported on this platform");
        }

        debug!("Native TTS backend created successfully");

        Ok(Self {
            tts,
            events,
            pending,
            next_tag: 0,
        })
    }

    fn register_callbacks(
        tts: &mut TtsCrate,
        events: &Sender<EngineEvent>,
        pending: &PendingMap,
    ) -> Result<()> {
        let map_err =
            |e: tts::Error| LeitorError::Synthesis(format!("Failed to register callback: {}", e));

        let (tx, map) = (events.clone(), Arc::clone(pending));
        tts.on_utterance_begin(Some(Box::new(move |id: UtteranceId| {
            if let Some(tag) = Self::lookup(&map, &id, false) {
                let _ = tx.send(EngineEvent::Started(tag));
            }
        })))
        .map_err(map_err)?;

        let (tx, map) = (events.clone(), Arc::clone(pending));
        tts.on_utterance_end(Some(Box::new(move |id: UtteranceId| {
            if let Some(tag) = Self::lookup(&map, &id, true) {
                let _ = tx.send(EngineEvent::Finished(tag));
            }
        })))
        .map_err(map_err)?;

        let (tx, map) = (events.clone(), Arc::clone(pending));
        tts.on_utterance_stop(Some(Box::new(move |id: UtteranceId| {
            if let Some(tag) = Self::lookup(&map, &id, true) {
                let _ = tx.send(EngineEvent::Stopped(tag));
            }
        })))
        .map_err(map_err)?;

        Ok(())
    }

    /// Find the tag for an engine utterance id, optionally retiring it
    fn lookup(map: &PendingMap, id: &UtteranceId, retire: bool) -> Option<UtteranceTag> {
        let mut entries = map.lock().ok()?;
        let pos = entries.iter().position(|(known, _)| known == id)?;
        let tag = entries[pos].1;
        if retire {
            entries.remove(pos);
        }
        Some(tag)
    }

    /// Convert a rate multiplier (1.0 = normal) to the engine's scale
    ///
    /// Engines use platform-specific rate ranges; interpolate between
    /// the platform's minimum, normal and maximum.
    fn convert_rate(&self, rate: f32) -> f32 {
        let rate = rate.clamp(0.1, 10.0);
        let normal = self.tts.normal_rate();
        if rate >= 1.0 {
            normal + (self.tts.max_rate() - normal) * ((rate - 1.0) / 9.0)
        } else {
            self.tts.min_rate() + (normal - self.tts.min_rate()) * ((rate - 0.1) / 0.9)
        }
    }

    /// Convert a pitch value (0-2, 1.0 = normal) to the engine's scale
    fn convert_pitch(&self, pitch: f32) -> f32 {
        let pitch = pitch.clamp(0.0, 2.0);
        let normal = self.tts.normal_pitch();
        if pitch >= 1.0 {
            normal + (self.tts.max_pitch() - normal) * (pitch - 1.0)
        } else {
            self.tts.min_pitch() + (normal - self.tts.min_pitch()) * pitch
        }
    }

    /// Convert volume (0-1) to the engine's scale
    fn convert_volume(&self, volume: f32) -> f32 {
        let volume = volume.clamp(0.0, 1.0);
        let min = self.tts.min_volume();
        min + (self.tts.max_volume() - min) * volume
    }

    /// Apply request parameters the platform supports
    fn configure(&mut self, request: &UtteranceRequest) -> Result<()> {
        let features = self.tts.supported_features();

        if features.rate {
            let rate = self.convert_rate(request.rate);
            self.tts
                .set_rate(rate)
                .map_err(|e| LeitorError::Synthesis(format!("Failed to set rate: {}", e)))?;
        } else {
            warn!("Rate control not supported on this platform");
        }

        if features.pitch {
            let pitch = self.convert_pitch(request.pitch);
            self.tts
                .set_pitch(pitch)
                .map_err(|e| LeitorError::Synthesis(format!("Failed to set pitch: {}", e)))?;
        } else {
            warn!("Pitch control not supported on this platform");
        }

        if features.volume {
            let volume = self.convert_volume(request.volume);
            self.tts
                .set_volume(volume)
                .map_err(|e| LeitorError::Synthesis(format!("Failed to set volume: {}", e)))?;
        } else {
            warn!("Volume control not supported on this platform");
        }

        if let Some(voice) = &request.voice {
            if features.voice {
                let available = self
                    .tts
                    .voices()
                    .map_err(|e| LeitorError::Synthesis(format!("Failed to get voices: {}", e)))?;
                if let Some(v) = available.iter().find(|v| v.id() == voice.id) {
                    debug!("Selecting voice: {}", voice.name);
                    self.tts.set_voice(v).map_err(|e| {
                        LeitorError::Synthesis(format!("Failed to set voice: {}", e))
                    })?;
                } else {
                    warn!("Voice {} no longer offered by the engine", voice.id);
                }
            } else {
                warn!("Voice selection not supported on this platform");
            }
        }

        Ok(())
    }
}

impl Synthesizer for NativeSynth {
    fn voices(&self) -> Result<Vec<Voice>> {
        let current = self.tts.voice().ok().flatten();

        let voices = self
            .tts
            .voices()
            .map_err(|e| LeitorError::Synthesis(format!("Failed to get voices: {}", e)))?;

        Ok(voices
            .into_iter()
            .map(|v| Voice {
                default: current.as_ref().map(|c| c.id() == v.id()).unwrap_or(false),
                id: v.id(),
                name: v.name(),
                language: v.language().as_str().to_string(),
            })
            .collect())
    }

    fn speak(&mut self, request: &UtteranceRequest) -> Result<UtteranceTag> {
        self.configure(request)?;

        let tag = UtteranceTag(self.next_tag);
        self.next_tag += 1;

        debug!("Speaking ({:?}): {:.50}", tag, request.text);
        let id = self
            .tts
            .speak(&request.text, false)
            .map_err(|e| LeitorError::Synthesis(format!("Speak failed: {}", e)))?;

        match id {
            Some(id) => {
                if let Ok(mut entries) = self.pending.lock() {
                    entries.push((id, tag));
                    while entries.len() > PENDING_LIMIT {
                        entries.remove(0);
                    }
                }
            }
            None => {
                // No utterance id means no callbacks; report the start
                // ourselves so the session is not left waiting.
                warn!("Engine returned no utterance id, completion will not be reported");
                let _ = self.events.send(EngineEvent::Started(tag));
            }
        }

        Ok(tag)
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.tts
            .stop()
            .map_err(|e| LeitorError::Synthesis(format!("Cancel failed: {}", e)))?;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        Err(LeitorError::Unsupported(
            "pause is not supported by the native engine".to_string(),
        ))
    }

    fn resume(&mut self) -> Result<()> {
        Err(LeitorError::Unsupported(
            "resume is not supported by the native engine".to_string(),
        ))
    }
}
