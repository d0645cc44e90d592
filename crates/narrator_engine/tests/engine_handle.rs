use std::sync::Arc;
use std::time::{Duration, Instant};

use narrator_core::{CommentaryConfig, MatchRecord, MonthKey, PlayerSide, TransitionError};
use narrator_engine::{EngineEvent, EngineHandle, EngineSettings, StaticIdentity};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Polls the handle the way a front end would until `done` matches.
async fn wait_for(handle: &EngineHandle, done: impl Fn(&EngineEvent) -> bool) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        while let Some(event) = handle.try_recv() {
            let finished = done(&event);
            seen.push(event);
            if finished {
                return seen;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("engine did not answer in time; saw {seen:?}");
}

fn settings_for(server: &MockServer, output: &tempfile::TempDir) -> EngineSettings {
    EngineSettings {
        base_url: server.uri(),
        output_dir: output.path().to_path_buf(),
        ..EngineSettings::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_games_reports_status_then_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/archives/hikaru"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "archives": ["https://api.chess.com/pub/player/hikaru/games/2024/03"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/games/hikaru/2024/03"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "games": [{
                "pgn": "1. e4 e5",
                "end_time": 1_709_251_200,
                "white": { "username": "hikaru", "rating": 3300, "result": "win" },
                "black": { "username": "opponent", "rating": 3000, "result": "resigned" }
            }]
        })))
        .mount(&server)
        .await;
    let output = tempfile::tempdir().unwrap();
    let handle = EngineHandle::new(
        settings_for(&server, &output),
        Arc::new(StaticIdentity::anonymous()),
    )
    .unwrap();

    handle.fetch_games("hikaru");
    let events = wait_for(&handle, |e| matches!(e, EngineEvent::GamesFetched { .. })).await;

    assert_eq!(
        events[0],
        EngineEvent::ArchiveStatus("Fetching archives for hikaru...".to_string())
    );
    match events.last() {
        Some(EngineEvent::GamesFetched { username, result }) => {
            assert_eq!(username, "hikaru");
            let records = result.as_ref().expect("games fetched");
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].month, MonthKey::new(2024, 3).unwrap());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn refused_commands_come_back_as_rejections() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();
    let handle = EngineHandle::new(
        settings_for(&server, &output),
        Arc::new(StaticIdentity::anonymous()),
    )
    .unwrap();
    let side = |name: &str| PlayerSide {
        username: name.to_string(),
        rating: 1500,
        result: "agreed".to_string(),
    };
    let record = MatchRecord {
        white: side("a"),
        black: side("b"),
        end_time: 1,
        pgn: "1. d4 1/2-1/2".to_string(),
        month: MonthKey::new(2024, 1).unwrap(),
        url: None,
        time_class: None,
    };

    handle.start_generation(record, CommentaryConfig::default());
    let events = wait_for(&handle, |e| matches!(e, EngineEvent::Rejected(_))).await;
    assert_eq!(
        events.last(),
        Some(&EngineEvent::Rejected(TransitionError::MissingAuth))
    );

    handle.download();
    let events = wait_for(&handle, |e| matches!(e, EngineEvent::Rejected(_))).await;
    assert!(matches!(
        events.last(),
        Some(EngineEvent::Rejected(TransitionError::InvalidTransition { .. }))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn recordings_are_listed_for_the_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recordings/user-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let output = tempfile::tempdir().unwrap();
    let handle = EngineHandle::new(
        settings_for(&server, &output),
        Arc::new(StaticIdentity::signed_in("user-9")),
    )
    .unwrap();

    handle.list_recordings("user-9");
    let events = wait_for(&handle, |e| matches!(e, EngineEvent::RecordingsListed(_))).await;
    assert_eq!(events.last(), Some(&EngineEvent::RecordingsListed(Ok(Vec::new()))));
}

#[tokio::test(flavor = "multi_thread")]
async fn past_recording_is_saved_under_its_suggested_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recordings/user-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "r1",
            "player_white": "Hikaru",
            "player_black": "Nepo",
            "created_at": "2024-06-01T12:30:00Z",
            "audio_url": format!("{}/audio/r1.wav", server.uri())
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/audio/r1.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFr1".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    let output = tempfile::tempdir().unwrap();
    let handle = EngineHandle::new(
        settings_for(&server, &output),
        Arc::new(StaticIdentity::signed_in("user-9")),
    )
    .unwrap();

    handle.list_recordings("user-9");
    let events = wait_for(&handle, |e| matches!(e, EngineEvent::RecordingsListed(_))).await;
    let Some(EngineEvent::RecordingsListed(Ok(recordings))) = events.last() else {
        panic!("expected a listing, got {events:?}");
    };
    let recording = &recordings[0];

    handle.download_file(recording.audio_url.clone(), recording.suggested_filename());
    let events = wait_for(&handle, |e| matches!(e, EngineEvent::DownloadFinished { .. })).await;

    let expected = output.path().join("Hikaru_vs_Nepo_commentary.wav");
    assert_eq!(
        events.last(),
        Some(&EngineEvent::DownloadFinished {
            filename: "Hikaru_vs_Nepo_commentary.wav".to_string(),
            path: Some(expected.clone()),
        })
    );
    assert_eq!(std::fs::read(&expected).unwrap(), b"RIFFr1");
}
