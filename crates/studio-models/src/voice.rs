//! Narration voice providers.

use serde::{Deserialize, Serialize};
use std::fmt;

const OPENAI_VOICES: &[&str] = &["shimmer", "alloy", "echo", "fable", "onyx", "nova"];
const ELEVENLABS_VOICES: &[&str] = &["Rachel", "Bella", "Adam", "Antoni"];

/// Text-to-speech provider. Voice catalogues do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VoiceProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "elevenlabs")]
    ElevenLabs,
}

impl VoiceProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceProvider::OpenAi => "openai",
            VoiceProvider::ElevenLabs => "elevenlabs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Some(VoiceProvider::OpenAi),
            "elevenlabs" => Some(VoiceProvider::ElevenLabs),
            _ => None,
        }
    }

    /// Voices offered by this provider; the first one is the default.
    pub fn voices(&self) -> &'static [&'static str] {
        match self {
            VoiceProvider::OpenAi => OPENAI_VOICES,
            VoiceProvider::ElevenLabs => ELEVENLABS_VOICES,
        }
    }

    pub fn default_voice(&self) -> &'static str {
        self.voices()[0]
    }

    pub fn has_voice(&self, voice: &str) -> bool {
        self.voices().contains(&voice)
    }
}

impl fmt::Display for VoiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of `POST /api/tts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationRequest {
    pub script: String,
    pub voice: String,
    pub provider: VoiceProvider,
}

/// Generated narration track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narration {
    /// URL the audio can be previewed from
    pub audio_url: String,
    /// Length in seconds
    #[serde(default)]
    pub duration: f64,
    /// Server-side file reference passed back on render submission
    pub audio_file: String,
}
