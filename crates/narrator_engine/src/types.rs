use std::path::PathBuf;

use chrono::{DateTime, Utc};
use narrator_core::{GenerationResult, MatchRecord, TransitionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Advisory narration while an archive aggregation runs.
    ArchiveStatus(String),
    GamesFetched {
        username: String,
        result: Result<Vec<MatchRecord>, ServiceError>,
    },
    /// Cosmetic status phrase while a generation is in flight.
    Narration { index: usize, phrase: String },
    GenerationSucceeded(GenerationResult),
    GenerationFailed { message: String },
    /// A command was refused by the workflow; nothing changed.
    Rejected(TransitionError),
    RecordingsListed(Result<Vec<Recording>, ServiceError>),
    DownloadFinished {
        filename: String,
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("could not find user or archives for {username}")]
    UserNotFound { username: String },
    #[error("no game archives found for {username}")]
    EmptyArchive { username: String },
    #[error("network error: {0}")]
    Network(String),
    /// Display is the server supplied message, unchanged.
    #[error("{message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },
}

impl ServiceError {
    pub(crate) fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        ServiceError::Backend {
            status,
            message: message.into(),
        }
    }
}

/// A previously generated commentary stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub id: String,
    pub player_white: String,
    pub player_black: String,
    pub created_at: DateTime<Utc>,
    pub audio_url: String,
}

impl Recording {
    pub fn suggested_filename(&self) -> String {
        format!(
            "{}_vs_{}_commentary.wav",
            self.player_white, self.player_black
        )
    }
}
