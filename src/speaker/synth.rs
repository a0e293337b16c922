//! Speech synthesizer abstraction
//!
//! A unified interface over platform text-to-speech engines. The
//! speaker drives exactly one utterance at a time through this trait
//! and observes the engine through tagged events on a channel.

use crate::Result;
use crossbeam_channel::Sender;
use log::info;

/// Tag identifying one utterance
///
/// Engine events carry the tag of the utterance they belong to, so
/// events from a pre-empted utterance can be told apart from the
/// current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceTag(pub u64);

/// One voice offered by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    /// Engine-specific identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Language code, e.g. "pt-BR"
    pub language: String,
    /// Whether the engine considers this its default voice
    pub default: bool,
}

/// Asynchronous event from the engine
///
/// Word-boundary callbacks are a reserved extension point; no current
/// backend produces them.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Playback of the utterance began
    Started(UtteranceTag),
    /// The utterance finished naturally
    Finished(UtteranceTag),
    /// The utterance was cancelled
    Stopped(UtteranceTag),
    /// The engine failed mid-utterance
    Failed {
        utterance: UtteranceTag,
        message: String,
    },
}

/// Everything needed to play one utterance
///
/// Built by the speaker for each speak command, merging per-call
/// options over the configured defaults, and dropped when the
/// utterance ends, errors or is cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceRequest {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub language: String,
    /// Voice selected for this utterance, if the engine offers any
    pub voice: Option<Voice>,
}

/// Speech synthesizer trait
///
/// Backends implement this to provide text-to-speech. Playback is
/// fire-and-forget: `speak` returns once the utterance is queued and
/// the outcome arrives later as an [`EngineEvent`].
pub trait Synthesizer: Send {
    /// Enumerate available voices
    fn voices(&self) -> Result<Vec<Voice>>;

    /// Begin playback of an utterance, returning its tag
    fn speak(&mut self, request: &UtteranceRequest) -> Result<UtteranceTag>;

    /// Cancel any in-flight utterance; a no-op when idle
    fn cancel(&mut self) -> Result<()>;

    /// Pause the in-flight utterance
    fn pause(&mut self) -> Result<()>;

    /// Resume a paused utterance
    fn resume(&mut self) -> Result<()>;
}

/// Create a platform-appropriate speech synthesizer
///
/// Engine callbacks are forwarded as [`EngineEvent`]s on the given
/// channel. Currently one backend exists, built on the `tts` crate
/// (Speech Dispatcher on Linux, AVFoundation on macOS, SAPI on
/// Windows); it provides a helpful error message when unavailable.
pub fn create_synth(events: Sender<EngineEvent>) -> Result<Box<dyn Synthesizer>> {
    let platform = std::env::consts::OS;
    info!("Creating speech synthesizer for platform: {}", platform);

    use super::backends::native::NativeSynth;

    match NativeSynth::new(events) {
        Ok(synth) => {
            info!("✓ Successfully initialized native TTS backend");
            Ok(Box::new(synth))
        }
        Err(e) => Err(crate::LeitorError::Unsupported(format!(
            "No speech backend available on '{}' (on Linux, install speech-dispatcher): {}",
            platform, e
        ))),
    }
}
