//! Cache of the last `games` listing, so `generate --game N` can refer to it.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use narrator_core::{MatchRecord, MonthKey, PlayerSide};
use narrator_engine::{AtomicFileWriter, PersistError};
use narrator_logging::{narrator_info, narrator_warn};
use serde::{Deserialize, Serialize};

const GAMES_FILENAME: &str = ".narrator_games.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSide {
    username: String,
    rating: u32,
    result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedGame {
    white: PersistedSide,
    black: PersistedSide,
    end_time: i64,
    pgn: String,
    year: u16,
    month: u8,
    url: Option<String>,
    time_class: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedGames {
    username: String,
    fetched_utc: String,
    games: Vec<PersistedGame>,
}

/// A listing read back from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedGames {
    pub username: String,
    pub games: Vec<MatchRecord>,
}

pub fn games_path(output_dir: &Path) -> PathBuf {
    output_dir.join(GAMES_FILENAME)
}

/// Returns `None` when nothing usable is cached; problems are logged.
pub fn load_games(output_dir: &Path) -> Option<CachedGames> {
    let path = games_path(output_dir);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            narrator_warn!("Failed to read cached games from {:?}: {}", path, err);
            return None;
        }
    };

    let state: PersistedGames = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            narrator_warn!("Failed to parse cached games from {:?}: {}", path, err);
            return None;
        }
    };

    let mut games = Vec::with_capacity(state.games.len());
    for game in state.games {
        let Some(month) = MonthKey::new(game.year, game.month) else {
            narrator_warn!("Dropping cached game with month {}-{}", game.year, game.month);
            continue;
        };
        games.push(MatchRecord {
            white: game.white.into(),
            black: game.black.into(),
            end_time: game.end_time,
            pgn: game.pgn,
            month,
            url: game.url,
            time_class: game.time_class,
        });
    }

    narrator_info!(
        "Loaded {} cached games for {} (fetched {})",
        games.len(),
        state.username,
        state.fetched_utc
    );
    Some(CachedGames {
        username: state.username,
        games,
    })
}

pub fn save_games(
    output_dir: &Path,
    username: &str,
    games: &[MatchRecord],
) -> Result<PathBuf, PersistError> {
    let state = PersistedGames {
        username: username.to_string(),
        fetched_utc: Utc::now().to_rfc3339(),
        games: games.iter().map(PersistedGame::from).collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&state, pretty)
        .map_err(|err| PersistError::Io(std::io::Error::other(err.to_string())))?;

    AtomicFileWriter::new(output_dir.to_path_buf()).write(GAMES_FILENAME, content.as_bytes())
}

impl From<&MatchRecord> for PersistedGame {
    fn from(record: &MatchRecord) -> Self {
        PersistedGame {
            white: (&record.white).into(),
            black: (&record.black).into(),
            end_time: record.end_time,
            pgn: record.pgn.clone(),
            year: record.month.year,
            month: record.month.month,
            url: record.url.clone(),
            time_class: record.time_class.clone(),
        }
    }
}

impl From<&PlayerSide> for PersistedSide {
    fn from(side: &PlayerSide) -> Self {
        PersistedSide {
            username: side.username.clone(),
            rating: side.rating,
            result: side.result.clone(),
        }
    }
}

impl From<PersistedSide> for PlayerSide {
    fn from(side: PersistedSide) -> Self {
        PlayerSide {
            username: side.username,
            rating: side.rating,
            result: side.result,
        }
    }
}
