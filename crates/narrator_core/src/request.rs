use std::fmt;
use std::str::FromStr;

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
    German,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLanguage(wanted.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VoiceConfig {
    /// The service's stock commentator voice.
    #[default]
    Standard,
    /// Clone the voice found in a previously uploaded sample.
    Cloned { sample: String },
}

/// User choices made before starting a generation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentaryConfig {
    pub language: Language,
    pub voice: VoiceConfig,
}

/// Inputs submitted to the generation service. Built once per submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub request_id: RequestId,
    pub pgn: String,
    pub language: Language,
    pub voice: VoiceConfig,
    pub user_id: String,
    pub player_white: String,
    pub player_black: String,
}

impl GenerationRequest {
    /// Reason the request cannot be sent, if any.
    pub(crate) fn problem(&self) -> Option<&'static str> {
        if self.pgn.trim().is_empty() {
            return Some("game has no move transcript");
        }
        if let VoiceConfig::Cloned { sample } = &self.voice {
            if sample.trim().is_empty() {
                return Some("a voice sample is required to clone a voice");
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Complete,
}

/// Terminal outcome of a successful generation. The artifact itself stays in
/// backend storage; only its URL is held here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub request_id: RequestId,
    pub artifact_url: String,
    pub status: ArtifactStatus,
    pub player_white: String,
    pub player_black: String,
    /// Non-fatal message the backend attached to a successful response.
    pub notice: Option<String>,
}

impl GenerationResult {
    pub fn suggested_filename(&self) -> String {
        format!(
            "commentary_{}_vs_{}.wav",
            self.player_white, self.player_black
        )
    }
}
