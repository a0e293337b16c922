//! Speaker command execution tests
//!
//! Exercises the speaker against a scripted synthesizer: option
//! merging, voice selection, pre-emption, idempotent stop, invalid
//! state reporting and the engine event mapping.

use crossbeam_channel::{unbounded, Receiver};
use leitor::config::SpeechDefaults;
use leitor::message::{Command, SpeakOptions, Status};
use leitor::speaker::{EngineEvent, Speaker, Synthesizer, UtteranceRequest, UtteranceTag, Voice};
use leitor::{LeitorError, Result};
use std::sync::{Arc, Mutex};

/// Scripted synthesizer recording every call
#[derive(Default)]
struct Script {
    calls: Vec<String>,
    requests: Vec<UtteranceRequest>,
}

struct ScriptedSynth {
    script: Arc<Mutex<Script>>,
    voices: Vec<Voice>,
    next_tag: u64,
    fail_speak: bool,
}

impl ScriptedSynth {
    fn new(voices: Vec<Voice>) -> (Self, Arc<Mutex<Script>>) {
        let script = Arc::new(Mutex::new(Script::default()));
        (
            Self {
                script: Arc::clone(&script),
                voices,
                next_tag: 0,
                fail_speak: false,
            },
            script,
        )
    }

    fn record(&self, call: &str) {
        self.script.lock().unwrap().calls.push(call.to_string());
    }
}

impl Synthesizer for ScriptedSynth {
    fn voices(&self) -> Result<Vec<Voice>> {
        Ok(self.voices.clone())
    }

    fn speak(&mut self, request: &UtteranceRequest) -> Result<UtteranceTag> {
        if self.fail_speak {
            return Err(LeitorError::Synthesis("engine refused".to_string()));
        }
        self.record(&format!("speak:{}", request.text));
        self.script.lock().unwrap().requests.push(request.clone());
        let tag = UtteranceTag(self.next_tag);
        self.next_tag += 1;
        Ok(tag)
    }

    fn cancel(&mut self) -> Result<()> {
        self.record("cancel");
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record("pause");
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.record("resume");
        Ok(())
    }
}

fn voice(name: &str, language: &str, default: bool) -> Voice {
    Voice {
        id: name.to_string(),
        name: name.to_string(),
        language: language.to_string(),
        default,
    }
}

fn defaults() -> SpeechDefaults {
    SpeechDefaults {
        rate: 1.0,
        pitch: 1.0,
        volume: 1.0,
        language: "pt-BR".to_string(),
    }
}

fn speaker_with_voices(
    voices: Vec<Voice>,
) -> (Speaker, Receiver<Status>, Arc<Mutex<Script>>) {
    let (synth, script) = ScriptedSynth::new(voices);
    let (status_tx, status_rx) = unbounded();
    let speaker = Speaker::new(Box::new(synth), defaults(), status_tx);
    (speaker, status_rx, script)
}

fn speaker() -> (Speaker, Receiver<Status>, Arc<Mutex<Script>>) {
    speaker_with_voices(vec![
        voice("Maria", "pt-BR", false),
        voice("Alice", "en-US", true),
    ])
}

fn speak(text: &str) -> Command {
    Command::Speak {
        text: text.to_string(),
        options: None,
    }
}

#[test]
fn test_speak_emits_started_with_merged_defaults() {
    let (mut speaker, status_rx, script) = speaker();

    speaker.handle_command(speak("Olá mundo"));

    assert_eq!(status_rx.try_recv().unwrap(), Status::Started);
    assert!(speaker.is_active());
    assert!(!speaker.is_paused());
    assert_eq!(speaker.current_text(), Some("Olá mundo"));

    let script = script.lock().unwrap();
    let request = &script.requests[0];
    assert_eq!(request.rate, 1.0);
    assert_eq!(request.pitch, 1.0);
    assert_eq!(request.volume, 1.0);
    assert_eq!(request.language, "pt-BR");
    // Preferred-language voice wins the first tier
    assert_eq!(request.voice.as_ref().unwrap().name, "Maria");
}

#[test]
fn test_explicit_options_win_field_by_field() {
    let (mut speaker, _status_rx, script) = speaker();

    speaker.handle_command(Command::Speak {
        text: "hello".to_string(),
        options: Some(SpeakOptions {
            rate: Some(2.0),
            language: Some("en-US".to_string()),
            ..Default::default()
        }),
    });

    let script = script.lock().unwrap();
    let request = &script.requests[0];
    assert_eq!(request.rate, 2.0);
    assert_eq!(request.pitch, 1.0); // untouched fields keep defaults
    assert_eq!(request.language, "en-US");
    assert_eq!(request.voice.as_ref().unwrap().name, "Alice");
}

#[test]
fn test_voice_falls_back_to_engine_default_then_first() {
    // No pt voice: second tier picks the engine default
    let (mut speaker, _rx, script) = speaker_with_voices(vec![
        voice("Alice", "en-US", false),
        voice("Bob", "en-GB", true),
    ]);
    speaker.handle_command(speak("oi"));
    assert_eq!(
        script.lock().unwrap().requests[0].voice.as_ref().unwrap().name,
        "Bob"
    );

    // No default either: third tier takes the first voice
    let (mut speaker, _rx, script) = speaker_with_voices(vec![
        voice("Alice", "en-US", false),
        voice("Bob", "en-GB", false),
    ]);
    speaker.handle_command(speak("oi"));
    assert_eq!(
        script.lock().unwrap().requests[0].voice.as_ref().unwrap().name,
        "Alice"
    );

    // No voices at all: speak still works, just without one
    let (mut speaker, rx, script) = speaker_with_voices(vec![]);
    speaker.handle_command(speak("oi"));
    assert_eq!(rx.try_recv().unwrap(), Status::Started);
    assert!(script.lock().unwrap().requests[0].voice.is_none());
}

#[test]
fn test_explicit_voice_short_circuits_tiers() {
    let (mut speaker, _rx, script) = speaker();

    speaker.handle_command(Command::Speak {
        text: "hello".to_string(),
        options: Some(SpeakOptions {
            voice: Some("Alice".to_string()),
            ..Default::default()
        }),
    });

    assert_eq!(
        script.lock().unwrap().requests[0].voice.as_ref().unwrap().name,
        "Alice"
    );
}

#[test]
fn test_speak_preempts_active_utterance() {
    let (mut speaker, status_rx, script) = speaker();

    speaker.handle_command(speak("primeiro"));
    speaker.handle_command(speak("segundo"));

    assert_eq!(status_rx.try_recv().unwrap(), Status::Started);
    assert_eq!(status_rx.try_recv().unwrap(), Status::Started);
    assert_eq!(speaker.current_text(), Some("segundo"));

    let script = script.lock().unwrap();
    assert_eq!(
        script.calls,
        vec!["speak:primeiro", "cancel", "speak:segundo"]
    );
}

#[test]
fn test_stale_engine_events_are_dropped() {
    let (mut speaker, status_rx, _script) = speaker();

    speaker.handle_command(speak("primeiro")); // tag 0
    speaker.handle_command(speak("segundo")); // tag 1
    while status_rx.try_recv().is_ok() {}

    // The pre-empted utterance's tail events must not disturb the
    // current one.
    speaker.handle_engine_event(EngineEvent::Stopped(UtteranceTag(0)));
    speaker.handle_engine_event(EngineEvent::Finished(UtteranceTag(0)));
    assert!(status_rx.try_recv().is_err());
    assert!(speaker.is_active());

    speaker.handle_engine_event(EngineEvent::Finished(UtteranceTag(1)));
    assert_eq!(status_rx.try_recv().unwrap(), Status::Finished);
    assert!(!speaker.is_active());
}

#[test]
fn test_stop_is_idempotent() {
    let (mut speaker, status_rx, _script) = speaker();

    speaker.handle_command(Command::Stop);
    assert_eq!(status_rx.try_recv().unwrap(), Status::Stopped);
    assert!(!speaker.is_active());

    speaker.handle_command(Command::Stop);
    assert_eq!(status_rx.try_recv().unwrap(), Status::Stopped);
    assert!(!speaker.is_active());
    assert!(!speaker.is_paused());
}

#[test]
fn test_stop_cancels_active_utterance() {
    let (mut speaker, status_rx, script) = speaker();

    speaker.handle_command(speak("texto"));
    let _ = status_rx.try_recv();

    speaker.handle_command(Command::Stop);
    assert_eq!(status_rx.try_recv().unwrap(), Status::Stopped);
    assert!(!speaker.is_active());
    assert!(script.lock().unwrap().calls.contains(&"cancel".to_string()));
}

#[test]
fn test_pause_when_idle_is_invalid_state() {
    let (mut speaker, status_rx, _script) = speaker();

    speaker.handle_command(Command::Pause);

    match status_rx.try_recv().unwrap() {
        Status::Error { error } => assert!(error.contains("Invalid state")),
        other => panic!("expected error status, got {:?}", other),
    }
    assert!(!speaker.is_active());
    assert!(!speaker.is_paused());
}

#[test]
fn test_resume_when_not_paused_is_invalid_state() {
    let (mut speaker, status_rx, _script) = speaker();

    speaker.handle_command(speak("texto"));
    let _ = status_rx.try_recv();

    speaker.handle_command(Command::Resume);

    match status_rx.try_recv().unwrap() {
        Status::Error { error } => assert!(error.contains("Invalid state")),
        other => panic!("expected error status, got {:?}", other),
    }
    // The active utterance is untouched
    assert!(speaker.is_active());
    assert!(!speaker.is_paused());
}

#[test]
fn test_pause_resume_flow() {
    let (mut speaker, status_rx, script) = speaker();

    speaker.handle_command(speak("texto"));
    let _ = status_rx.try_recv();

    speaker.handle_command(Command::Pause);
    assert_eq!(status_rx.try_recv().unwrap(), Status::Paused);
    assert!(speaker.is_paused());

    speaker.handle_command(Command::Resume);
    assert_eq!(status_rx.try_recv().unwrap(), Status::Resumed);
    assert!(!speaker.is_paused());
    assert!(speaker.is_active());

    let calls = &script.lock().unwrap().calls;
    assert!(calls.contains(&"pause".to_string()));
    assert!(calls.contains(&"resume".to_string()));
}

#[test]
fn test_engine_failure_is_reported() {
    let (mut speaker, status_rx, _script) = speaker();

    speaker.handle_command(speak("texto"));
    let _ = status_rx.try_recv();

    speaker.handle_engine_event(EngineEvent::Failed {
        utterance: UtteranceTag(0),
        message: "device lost".to_string(),
    });

    assert_eq!(
        status_rx.try_recv().unwrap(),
        Status::Error {
            error: "device lost".to_string()
        }
    );
    assert!(!speaker.is_active());
}

#[test]
fn test_speak_failure_is_reported() {
    let (synth, _script) = ScriptedSynth::new(vec![]);
    let mut synth = synth;
    synth.fail_speak = true;
    let (status_tx, status_rx) = unbounded();
    let mut speaker = Speaker::new(Box::new(synth), defaults(), status_tx);

    speaker.handle_command(speak("texto"));

    match status_rx.try_recv().unwrap() {
        Status::Error { error } => assert!(error.contains("engine refused")),
        other => panic!("expected error status, got {:?}", other),
    }
    assert!(!speaker.is_active());
}

#[test]
fn test_page_hidden_pauses_and_visible_resumes() {
    let (mut speaker, status_rx, _script) = speaker();

    speaker.handle_command(speak("texto"));
    let _ = status_rx.try_recv();

    speaker.page_hidden();
    assert_eq!(status_rx.try_recv().unwrap(), Status::Paused);
    assert!(speaker.is_paused());

    // A second hide is a no-op while already paused
    speaker.page_hidden();
    assert!(status_rx.try_recv().is_err());

    speaker.page_visible();
    assert_eq!(status_rx.try_recv().unwrap(), Status::Resumed);
    assert!(!speaker.is_paused());
}

#[test]
fn test_page_hidden_when_idle_is_a_no_op() {
    let (mut speaker, status_rx, script) = speaker();

    speaker.page_hidden();
    speaker.page_visible();

    assert!(status_rx.try_recv().is_err());
    assert!(script.lock().unwrap().calls.is_empty());
}

#[test]
fn test_unload_cancels_silently() {
    let (mut speaker, status_rx, script) = speaker();

    speaker.handle_command(speak("texto"));
    let _ = status_rx.try_recv();

    speaker.unload();

    assert!(!speaker.is_active());
    assert!(status_rx.try_recv().is_err());
    assert!(script.lock().unwrap().calls.contains(&"cancel".to_string()));

    // Unloading twice must not fail even with the synthesizer idle
    speaker.unload();
    assert!(status_rx.try_recv().is_err());
}

#[test]
fn test_updated_defaults_apply_to_later_utterances() {
    let (mut speaker, _rx, script) = speaker();

    speaker.handle_command(speak("antes"));
    speaker.update_defaults(SpeechDefaults {
        rate: 0.5,
        pitch: 1.2,
        volume: 0.7,
        language: "en-US".to_string(),
    });
    speaker.handle_command(speak("depois"));

    let script = script.lock().unwrap();
    assert_eq!(script.requests[0].rate, 1.0);
    let after = &script.requests[1];
    assert_eq!(after.rate, 0.5);
    assert_eq!(after.pitch, 1.2);
    assert_eq!(after.volume, 0.7);
    assert_eq!(after.language, "en-US");
    assert_eq!(after.voice.as_ref().unwrap().name, "Alice");
}

#[test]
fn test_empty_text_is_rejected() {
    let (mut speaker, status_rx, _script) = speaker();

    speaker.handle_command(speak(""));

    match status_rx.try_recv().unwrap() {
        Status::Error { error } => assert!(error.contains("Invalid state")),
        other => panic!("expected error status, got {:?}", other),
    }
    assert!(!speaker.is_active());
}
