//! JSON bodies exchanged with the backend, and their mapping to core types.
use chrono::{DateTime, NaiveDateTime, Utc};
use narrator_core::{GenerationRequest, MatchRecord, MonthKey, PlayerSide, VoiceConfig};
use narrator_logging::narrator_warn;
use serde::{Deserialize, Serialize};

use crate::Recording;

#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveListBody {
    pub archives: Option<Vec<String>>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MonthBody {
    pub games: Option<Vec<GameBody>>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GameBody {
    pub url: Option<String>,
    pub pgn: Option<String>,
    #[serde(default)]
    pub end_time: i64,
    pub white: SideBody,
    pub black: SideBody,
    pub time_class: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SideBody {
    pub username: String,
    #[serde(default)]
    pub rating: u32,
    #[serde(default)]
    pub result: String,
}

impl GameBody {
    pub fn into_record(self, month: MonthKey) -> MatchRecord {
        MatchRecord {
            white: self.white.into(),
            black: self.black.into(),
            end_time: self.end_time,
            pgn: self.pgn.unwrap_or_default(),
            month,
            url: self.url,
            time_class: self.time_class,
        }
    }
}

impl From<SideBody> for PlayerSide {
    fn from(side: SideBody) -> Self {
        PlayerSide {
            username: side.username,
            rating: side.rating,
            result: side.result,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateBody<'a> {
    pub pgn: &'a str,
    pub language: &'static str,
    pub user_id: &'a str,
    pub player_white: &'a str,
    pub player_black: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_sample: Option<&'a str>,
}

impl<'a> From<&'a GenerationRequest> for GenerateBody<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        let speaker_sample = match &request.voice {
            VoiceConfig::Standard => None,
            VoiceConfig::Cloned { sample } => Some(sample.as_str()),
        };
        GenerateBody {
            pgn: &request.pgn,
            language: request.language.as_str(),
            user_id: &request.user_id,
            player_white: &request.player_white,
            player_black: &request.player_black,
            speaker_sample,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    pub audio_url: Option<String>,
    /// Set alongside a usable URL when the backend fell back to local storage.
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// `detail` is a string for handler errors and a list for validation errors.
    pub fn message(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordingsBody {
    Bare(Vec<RecordingBody>),
    Wrapped { recordings: Vec<RecordingBody> },
}

impl RecordingsBody {
    pub fn into_recordings(self) -> Vec<Recording> {
        let rows = match self {
            RecordingsBody::Bare(rows) => rows,
            RecordingsBody::Wrapped { recordings } => recordings,
        };
        rows.into_iter().filter_map(RecordingBody::into_recording).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordingId {
    Text(String),
    Number(i64),
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordingBody {
    pub id: Option<RecordingId>,
    pub player_white: Option<String>,
    pub player_black: Option<String>,
    pub created_at: Option<String>,
    pub audio_url: Option<String>,
}

impl RecordingBody {
    /// `None` for rows that cannot be listed; each one is logged.
    fn into_recording(self) -> Option<Recording> {
        let Some(id) = self.id else {
            narrator_warn!("Skipping recording without an id");
            return None;
        };
        let id = match id {
            RecordingId::Text(text) => text,
            RecordingId::Number(number) => number.to_string(),
        };
        let Some(audio_url) = self.audio_url.filter(|url| !url.trim().is_empty()) else {
            narrator_warn!("Skipping recording {} without an audio url", id);
            return None;
        };
        let Some(created_at) = self.created_at.as_deref().and_then(parse_timestamp) else {
            narrator_warn!(
                "Skipping recording {} with unreadable created_at {:?}",
                id,
                self.created_at
            );
            return None;
        };
        Some(Recording {
            id,
            player_white: self.player_white.unwrap_or_else(|| "Unknown".to_string()),
            player_black: self.player_black.unwrap_or_else(|| "Unknown".to_string()),
            created_at,
            audio_url,
        })
    }
}

/// RFC 3339, or an offset-less ISO timestamp taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
