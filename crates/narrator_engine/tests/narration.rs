use std::sync::{Arc, Mutex};
use std::time::Duration;

use narrator_engine::{EngineEvent, ProgressSimulator, ProgressSink, MIN_NARRATION_INTERVAL};
use pretty_assertions::assert_eq;
use tokio::runtime::Handle;

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn phrases(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Narration { phrase, .. } => Some(phrase.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn simulator(sink: &Arc<TestSink>) -> ProgressSimulator {
    ProgressSimulator::new(
        ["connecting", "analyzing", "speaking"],
        Duration::from_secs(4),
        sink.clone(),
        Handle::current(),
    )
}

#[tokio::test(start_paused = true)]
async fn phrases_cycle_and_wrap_around() {
    let sink = Arc::new(TestSink::default());
    let mut narration = simulator(&sink);

    narration.start();
    assert_eq!(sink.phrases(), vec!["connecting"]);

    tokio::time::sleep(Duration::from_millis(12_500)).await;
    assert_eq!(
        sink.phrases(),
        vec!["connecting", "analyzing", "speaking", "connecting"]
    );
    assert_eq!(narration.current_phrase().as_deref(), Some("connecting"));
}

#[tokio::test(start_paused = true)]
async fn starting_twice_keeps_a_single_ticker() {
    let sink = Arc::new(TestSink::default());
    let mut narration = simulator(&sink);

    narration.start();
    narration.start();
    tokio::time::sleep(Duration::from_millis(8_500)).await;

    assert_eq!(sink.phrases(), vec!["connecting", "analyzing", "speaking"]);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_emitted_after_stop() {
    let sink = Arc::new(TestSink::default());
    let mut narration = simulator(&sink);

    narration.start();
    tokio::time::sleep(Duration::from_millis(4_500)).await;
    narration.stop();
    narration.stop();
    assert!(!narration.is_running());
    assert_eq!(narration.current_phrase(), None);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(sink.phrases(), vec!["connecting", "analyzing"]);
}

#[tokio::test(start_paused = true)]
async fn restart_begins_from_the_first_phrase() {
    let sink = Arc::new(TestSink::default());
    let mut narration = simulator(&sink);

    narration.start();
    tokio::time::sleep(Duration::from_millis(4_500)).await;
    narration.stop();
    narration.start();
    tokio::time::sleep(Duration::from_millis(4_500)).await;

    assert_eq!(
        sink.phrases(),
        vec!["connecting", "analyzing", "connecting", "analyzing"]
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_the_simulator_stops_it() {
    let sink = Arc::new(TestSink::default());
    let mut narration = simulator(&sink);

    narration.start();
    drop(narration);
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(sink.phrases(), vec!["connecting"]);
}

#[tokio::test(start_paused = true)]
async fn generation_phrases_start_with_engine_connection() {
    let sink = Arc::new(TestSink::default());
    let mut narration =
        ProgressSimulator::generation(Duration::from_secs(4), sink.clone(), Handle::current());

    narration.start();

    assert_eq!(
        sink.events.lock().unwrap().first(),
        Some(&EngineEvent::Narration {
            index: 0,
            phrase: "Connecting to Stockfish Engine...".to_string()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn zero_interval_still_cycles() {
    let sink = Arc::new(TestSink::default());
    let mut narration = ProgressSimulator::new(
        ["connecting", "analyzing"],
        Duration::ZERO,
        sink.clone(),
        Handle::current(),
    );
    assert_eq!(narration.interval(), MIN_NARRATION_INTERVAL);

    narration.start();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(narration.is_running());
    assert!(sink.phrases().len() > 2, "{:?}", sink.phrases());
    narration.stop();
    let emitted = sink.phrases().len();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(sink.phrases().len(), emitted);
}
