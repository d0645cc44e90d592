use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use narrator_engine::{Downloader, EngineEvent, EngineSettings, ProgressSink};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::runtime::Handle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn downloader(dir: &TempDir, max_bytes: u64) -> Downloader {
    let settings = EngineSettings {
        output_dir: dir.path().join("output"),
        max_download_bytes: max_bytes,
        ..EngineSettings::default()
    };
    Downloader::new(&settings, Handle::current()).unwrap()
}

async fn serve_audio(body: &'static [u8]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio/final.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn artifact_is_saved_under_its_sanitized_name() {
    let server = serve_audio(b"RIFF....WAVEfmt ").await;
    let temp = TempDir::new().unwrap();
    let sink = Arc::new(TestSink::default());
    let downloader = downloader(&temp, 1024).with_sink(sink.clone());

    let saved = downloader
        .download(
            format!("{}/audio/final.wav", server.uri()),
            "commentary_Hikaru_vs_Magnus:Carlsen?.wav",
        )
        .await
        .unwrap()
        .expect("saved");

    assert_eq!(
        saved,
        temp.path()
            .join("output")
            .join("commentary_Hikaru_vs_Magnus_Carlsen.wav")
    );
    assert_eq!(fs::read(&saved).unwrap(), b"RIFF....WAVEfmt ");
    assert_eq!(
        sink.events.lock().unwrap().as_slice(),
        &[EngineEvent::DownloadFinished {
            filename: "commentary_Hikaru_vs_Magnus_Carlsen.wav".to_string(),
            path: Some(saved.clone()),
        }]
    );
}

#[tokio::test]
async fn oversized_artifact_is_not_written() {
    let server = serve_audio(b"0123456789").await;
    let temp = TempDir::new().unwrap();

    let saved: Option<PathBuf> = downloader(&temp, 4)
        .download(format!("{}/audio/final.wav", server.uri()), "big.wav")
        .await
        .unwrap();

    assert_eq!(saved, None);
    assert!(!temp.path().join("output").join("big.wav").exists());
}

#[tokio::test]
async fn missing_artifact_reports_no_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio/gone.wav"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let sink = Arc::new(TestSink::default());

    let saved = downloader(&temp, 1024)
        .with_sink(sink.clone())
        .download(format!("{}/audio/gone.wav", server.uri()), "gone.wav")
        .await
        .unwrap();

    assert_eq!(saved, None);
    assert_eq!(
        sink.events.lock().unwrap().as_slice(),
        &[EngineEvent::DownloadFinished {
            filename: "gone.wav".to_string(),
            path: None,
        }]
    );
}
