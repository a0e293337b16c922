//! Message envelopes exchanged between the coordinator and the speaker
//!
//! Both directions share one channel pair: commands flow from the
//! coordinator to the speaker, status events flow back. The JSON shape
//! (`{"command": ...}` / `{"status": ...}`) is the external wire format;
//! in-process the enums are passed as-is.

use serde::{Deserialize, Serialize};

/// Command sent from the coordinator to the speaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    /// Speak the given text, pre-empting any utterance in flight
    Speak {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<SpeakOptions>,
    },
    /// Cancel the active utterance
    Stop,
    /// Pause the active utterance
    Pause,
    /// Resume a paused utterance
    Resume,
}

/// Status event sent from the speaker back to the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Status {
    Started,
    Finished,
    Stopped,
    Paused,
    Resumed,
    Error { error: String },
}

/// Per-call speech options
///
/// Every field is optional; unset fields fall back to the configured
/// defaults, merged field-by-field by the speaker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,

    /// Language code, e.g. "pt-BR"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Voice name, matched against the synthesizer's voice list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_shape() {
        let cmd = Command::Speak {
            text: "Olá mundo".to_string(),
            options: None,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"command":"speak","text":"Olá mundo"}"#);

        let json = serde_json::to_string(&Command::Stop).unwrap();
        assert_eq!(json, r#"{"command":"stop"}"#);
    }

    #[test]
    fn test_status_wire_shape() {
        let json = serde_json::to_string(&Status::Paused).unwrap();
        assert_eq!(json, r#"{"status":"paused"}"#);

        let status = Status::Error {
            error: "no voice".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"status":"error","error":"no voice"}"#);
    }

    #[test]
    fn test_command_round_trip() {
        let cmd = Command::Speak {
            text: "hello".to_string(),
            options: Some(SpeakOptions {
                rate: Some(1.5),
                language: Some("en-US".to_string()),
                ..Default::default()
            }),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let parsed: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn test_speak_without_options_parses() {
        let parsed: Command =
            serde_json::from_str(r#"{"command":"speak","text":"oi"}"#).unwrap();
        assert_eq!(
            parsed,
            Command::Speak {
                text: "oi".to_string(),
                options: None
            }
        );
    }
}
