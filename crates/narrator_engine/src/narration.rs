use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use narrator_core::STATUS_PHRASES;
use narrator_logging::narrator_trace;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, ProgressSink};

/// Shortest tick period; shorter intervals, including zero, are raised to it.
pub const MIN_NARRATION_INTERVAL: Duration = Duration::from_millis(1);

/// Cycles a fixed list of status phrases on a timer.
///
/// Purely cosmetic: nothing here knows how far the backend actually got.
/// `start` and `stop` are idempotent, and once `stop` returns no further
/// phrase reaches the sink. Dropping the simulator stops it.
pub struct ProgressSimulator {
    phrases: Arc<[String]>,
    interval: Duration,
    sink: Arc<dyn ProgressSink>,
    runtime: Handle,
    running: Option<RunningTicker>,
}

struct RunningTicker {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    state: Arc<Mutex<TickerState>>,
}

/// Fresh per run, so a ticker task outliving its `stop` can never see the
/// `active` flag of a later run.
struct TickerState {
    index: usize,
    active: bool,
}

impl ProgressSimulator {
    pub fn new<I, P>(phrases: I, interval: Duration, sink: Arc<dyn ProgressSink>, runtime: Handle) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
            interval: interval.max(MIN_NARRATION_INTERVAL),
            sink,
            runtime,
            running: None,
        }
    }

    /// Simulator over the generation pipeline phrases.
    pub fn generation(interval: Duration, sink: Arc<dyn ProgressSink>, runtime: Handle) -> Self {
        Self::new(STATUS_PHRASES, interval, sink, runtime)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn current_phrase(&self) -> Option<String> {
        let running = self.running.as_ref()?;
        let index = lock(&running.state).index;
        self.phrases.get(index).cloned()
    }

    /// Emits the first phrase immediately, then one per interval.
    pub fn start(&mut self) {
        if self.running.is_some() || self.phrases.is_empty() {
            return;
        }

        let state = Arc::new(Mutex::new(TickerState {
            index: 0,
            active: true,
        }));
        self.sink.emit(EngineEvent::Narration {
            index: 0,
            phrase: self.phrases[0].clone(),
        });

        let cancel = CancellationToken::new();
        let task = self.runtime.spawn(run_ticker(
            Arc::clone(&self.phrases),
            self.interval,
            Arc::clone(&self.sink),
            Arc::clone(&state),
            cancel.clone(),
        ));
        self.running = Some(RunningTicker {
            cancel,
            task,
            state,
        });
    }

    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        // Emission happens under this lock, so nothing gets out after it is released.
        lock(&running.state).active = false;
        running.cancel.cancel();
        running.task.abort();
        narrator_trace!("Narration stopped");
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticker(
    phrases: Arc<[String]>,
    period: Duration,
    sink: Arc<dyn ProgressSink>,
    state: Arc<Mutex<TickerState>>,
    cancel: CancellationToken,
) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            _ = ticks.tick() => {
                let mut ticker = lock(&state);
                if !ticker.active {
                    break;
                }
                ticker.index = (ticker.index + 1) % phrases.len();
                sink.emit(EngineEvent::Narration {
                    index: ticker.index,
                    phrase: phrases[ticker.index].clone(),
                });
            }
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
