use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use narrator_core::{CommentaryConfig, Language, MatchRecord, VoiceConfig};
use narrator_engine::{EngineEvent, EngineHandle, EngineSettings, Recording, StaticIdentity};
use narrator_logging::{narrator_debug, narrator_info, narrator_warn};

use crate::cli::Command;
use crate::config::Resolved;
use crate::platform::persistence::{load_games, save_games};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum Flow {
    Continue,
    Done,
}

pub fn run(command: Command, resolved: &Resolved) -> Result<()> {
    match command {
        Command::Games { username, .. } => games(resolved, &username),
        Command::Generate {
            game,
            language,
            voice_sample,
            download,
        } => generate(resolved, game, language, voice_sample, download),
        Command::Recordings { download } => recordings(resolved, download.as_deref()),
    }
}

fn start_engine(resolved: &Resolved) -> Result<EngineHandle> {
    let identity = Arc::new(StaticIdentity::new(resolved.user_id.clone()));
    EngineHandle::new(resolved.settings.clone(), identity)
        .context("failed to start the narrator engine")
}

/// Feeds engine events to `on_event` until it reports `Done` or `timeout` passes
/// without that happening.
fn pump(
    engine: &EngineHandle,
    timeout: Duration,
    mut on_event: impl FnMut(EngineEvent) -> Result<Flow>,
) -> Result<()> {
    let deadline = deadline_after(timeout);
    loop {
        match engine.try_recv() {
            Some(event) => {
                if let Flow::Done = on_event(event)? {
                    return Ok(());
                }
            }
            None => {
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    bail!(
                        "no answer from the engine within {} seconds",
                        timeout.as_secs()
                    );
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

/// `None` when the timeout reaches past what `Instant` can represent.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Index fetch plus one request per month.
fn games_wait(settings: &EngineSettings) -> Duration {
    let requests = u32::try_from(settings.archive_window)
        .unwrap_or(u32::MAX)
        .saturating_add(1);
    settings.request_timeout.saturating_mul(requests)
}

fn generation_wait(settings: &EngineSettings) -> Duration {
    settings
        .generation_timeout
        .saturating_add(settings.request_timeout)
}

fn listing_wait(settings: &EngineSettings) -> Duration {
    settings.request_timeout.saturating_mul(2)
}

fn games(resolved: &Resolved, username: &str) -> Result<()> {
    let settings = &resolved.settings;
    let engine = start_engine(resolved)?;

    engine.fetch_games(username);
    let mut fetched = None;
    pump(&engine, games_wait(settings), |event| match event {
        EngineEvent::ArchiveStatus(status) => {
            println!("{status}");
            Ok(Flow::Continue)
        }
        EngineEvent::GamesFetched { result, .. } => {
            fetched = Some(result);
            Ok(Flow::Done)
        }
        _ => Ok(Flow::Continue),
    })?;

    let records = fetched
        .ok_or_else(|| anyhow!("engine stopped before listing games"))?
        .with_context(|| format!("could not fetch games for {username}"))?;

    if records.is_empty() {
        println!(
            "No games found for {username} in the last {} months.",
            settings.archive_window
        );
    }
    for (index, record) in records.iter().enumerate() {
        println!("{}", game_line(index + 1, record, username));
    }

    match save_games(&settings.output_dir, username, &records) {
        Ok(path) => narrator_info!("Cached {} games in {}", records.len(), path.display()),
        Err(err) => narrator_warn!("Could not cache the game list: {}", err),
    }
    Ok(())
}

fn generate(
    resolved: &Resolved,
    position: usize,
    language: Language,
    voice_sample: Option<String>,
    download: bool,
) -> Result<()> {
    let settings = &resolved.settings;
    let cached = load_games(&settings.output_dir).ok_or_else(|| {
        anyhow!(
            "no cached games in {}; run `narrator games <username>` first",
            settings.output_dir.display()
        )
    })?;
    let record = pick_game(&cached.games, position)?.clone();
    narrator_debug!("Game {} of the listing for {}", position, cached.username);

    let config = CommentaryConfig {
        language,
        voice: match voice_sample {
            Some(sample) => VoiceConfig::Cloned { sample },
            None => VoiceConfig::Standard,
        },
    };
    println!(
        "Generating {} commentary for {} vs {}",
        language, record.white.username, record.black.username
    );

    let engine = start_engine(resolved)?;
    engine.start_generation(record, config);

    pump(&engine, generation_wait(settings), |event| match event {
        EngineEvent::Narration { phrase, .. } => {
            println!("  {phrase}");
            Ok(Flow::Continue)
        }
        EngineEvent::Rejected(err) => Err(anyhow!("generation refused: {err}")),
        EngineEvent::GenerationFailed { message } => Err(anyhow!("generation failed: {message}")),
        EngineEvent::GenerationSucceeded(result) => {
            println!("Commentary ready: {}", result.artifact_url);
            if let Some(notice) = &result.notice {
                println!("Note: {notice}");
            }
            if download {
                engine.download();
                Ok(Flow::Continue)
            } else {
                Ok(Flow::Done)
            }
        }
        EngineEvent::DownloadFinished { filename, path } => match path {
            Some(path) => {
                println!("Saved {}", path.display());
                Ok(Flow::Done)
            }
            None => Err(anyhow!("could not save {filename}; see the log for details")),
        },
        _ => Ok(Flow::Continue),
    })
}

fn recordings(resolved: &Resolved, download: Option<&str>) -> Result<()> {
    let Some(user_id) = resolved.user_id.clone() else {
        bail!("listing recordings needs a user; pass --user-id or set NARRATOR_USER_ID");
    };
    let engine = start_engine(resolved)?;
    engine.list_recordings(user_id);

    let mut listed = None;
    pump(&engine, listing_wait(&resolved.settings), |event| match event {
        EngineEvent::RecordingsListed(result) => {
            listed = Some(result);
            Ok(Flow::Done)
        }
        _ => Ok(Flow::Continue),
    })?;

    let recordings = listed
        .ok_or_else(|| anyhow!("engine stopped before listing recordings"))?
        .context("could not list recordings")?;
    if recordings.is_empty() {
        println!("No recordings yet.");
    }
    for (index, recording) in recordings.iter().enumerate() {
        println!("{}", recording_line(index + 1, recording));
    }

    let Some(selector) = download else {
        return Ok(());
    };
    let recording = pick_recording(&recordings, selector)?;
    engine.download_file(recording.audio_url.clone(), recording.suggested_filename());
    pump(&engine, listing_wait(&resolved.settings), |event| match event {
        EngineEvent::DownloadFinished { filename, path } => match path {
            Some(path) => {
                println!("Saved {}", path.display());
                Ok(Flow::Done)
            }
            None => Err(anyhow!("could not save {filename}; see the log for details")),
        },
        _ => Ok(Flow::Continue),
    })
}

/// A 1-based position in the listing, or else a recording id.
fn pick_recording<'a>(recordings: &'a [Recording], selector: &str) -> Result<&'a Recording> {
    let selector = selector.trim();
    let by_position = selector
        .parse::<usize>()
        .ok()
        .and_then(|position| position.checked_sub(1))
        .and_then(|index| recordings.get(index));
    by_position
        .or_else(|| recordings.iter().find(|recording| recording.id == selector))
        .ok_or_else(|| anyhow!("no recording {selector} in the listing"))
}

fn pick_game(games: &[MatchRecord], position: usize) -> Result<&MatchRecord> {
    position
        .checked_sub(1)
        .and_then(|index| games.get(index))
        .ok_or_else(|| {
            anyhow!(
                "game {position} is not in the last listing ({} games)",
                games.len()
            )
        })
}

/// `  1. 2023-11-14  Hikaru (3250) vs Firouzja2003 (3100)  [Won] blitz`
pub fn game_line(position: usize, record: &MatchRecord, username: &str) -> String {
    let played = DateTime::<Utc>::from_timestamp(record.end_time, 0)
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "????-??-??".to_string());
    let badge = record
        .outcome_for(username)
        .map(|outcome| outcome.to_string())
        .unwrap_or_else(|| "-".to_string());
    let line = format!(
        "{position:>3}. {played}  {} ({}) vs {} ({})  [{badge}] {}",
        record.white.username,
        record.white.rating,
        record.black.username,
        record.black.rating,
        record.time_class.as_deref().unwrap_or_default(),
    );
    line.trim_end().to_string()
}

/// `  1. 2024-06-01 12:30  Hikaru vs Nepo  https://...`
pub fn recording_line(position: usize, recording: &Recording) -> String {
    format!(
        "{position:>3}. {}  {} vs {}  {}",
        recording.created_at.format("%Y-%m-%d %H:%M"),
        recording.player_white,
        recording.player_black,
        recording.audio_url
    )
}
