use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::{stream, Stream, StreamExt};
use narrator_core::{
    merge_by_end_time, select_recent_months, ArchiveIndex, MatchRecord, MonthKey, SelectionError,
};
use narrator_logging::{narrator_debug, narrator_info, narrator_warn};

use crate::{EngineEvent, ProgressSink, ServiceError, DEFAULT_ARCHIVE_WINDOW};

/// Where monthly game archives come from.
#[async_trait::async_trait]
pub trait ArchiveSource: Send + Sync {
    async fn fetch_archive_index(&self, username: &str) -> Result<ArchiveIndex, ServiceError>;

    async fn fetch_month(
        &self,
        username: &str,
        month: MonthKey,
    ) -> Result<Vec<MatchRecord>, ServiceError>;
}

/// What to do when one month of the window cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFailurePolicy {
    /// End the aggregation with the month's error; earlier months are discarded.
    #[default]
    Abort,
    /// Report the month as skipped and keep going. Fails only if no month succeeded.
    SkipFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationEvent {
    Status(String),
    IndexLoaded { months: Vec<MonthKey> },
    MonthFetched { month: MonthKey, games: usize },
    MonthSkipped { month: MonthKey, error: ServiceError },
    /// Final, newest-first result. Always the last event on success.
    Completed(Vec<MatchRecord>),
    /// Always the last event on failure.
    Failed(ServiceError),
}

/// Fetches the most recent months of a user's archive, one month at a time,
/// and merges them newest first.
#[derive(Clone)]
pub struct ArchiveFetcher {
    source: Arc<dyn ArchiveSource>,
    window: usize,
    policy: MonthFailurePolicy,
}

impl ArchiveFetcher {
    pub fn new(source: Arc<dyn ArchiveSource>) -> Self {
        Self {
            source,
            window: DEFAULT_ARCHIVE_WINDOW,
            policy: MonthFailurePolicy::default(),
        }
    }

    pub fn with_window(mut self, months: usize) -> Self {
        self.window = months;
        self
    }

    pub fn with_failure_policy(mut self, policy: MonthFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Lazily drives one aggregation. Each month request is only issued once
    /// the consumer has taken the status event announcing it.
    pub fn events(&self, username: &str) -> impl Stream<Item = AggregationEvent> + Send + 'static {
        let cursor = Cursor {
            source: Arc::clone(&self.source),
            username: username.to_string(),
            window: self.window,
            policy: self.policy,
            step: Step::AnnounceIndex,
            pending: VecDeque::new(),
            collected: Vec::new(),
            succeeded: 0,
            last_error: None,
        };
        stream::unfold(cursor, |mut cursor| async move {
            let event = cursor.advance().await?;
            Some((event, cursor))
        })
    }

    /// Runs [`events`](Self::events) to completion, forwarding status lines to `sink`.
    pub async fn aggregate(
        &self,
        username: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<MatchRecord>, ServiceError> {
        let mut events = Box::pin(self.events(username));
        while let Some(event) = events.next().await {
            match event {
                AggregationEvent::Status(status) => {
                    narrator_info!("{}", status);
                    sink.emit(EngineEvent::ArchiveStatus(status));
                }
                AggregationEvent::IndexLoaded { months } => {
                    narrator_debug!("{} archive months selected for {}", months.len(), username);
                }
                AggregationEvent::MonthFetched { month, games } => {
                    narrator_debug!("{} games in {} for {}", games, month, username);
                }
                AggregationEvent::MonthSkipped { month, error } => {
                    narrator_warn!("Skipping {} for {}: {}", month, username, error);
                }
                AggregationEvent::Completed(records) => return Ok(records),
                AggregationEvent::Failed(error) => return Err(error),
            }
        }
        Err(ServiceError::Network(format!(
            "archive aggregation for {username} ended without a result"
        )))
    }
}

enum Step {
    AnnounceIndex,
    LoadIndex,
    AnnounceMonth,
    LoadMonth(MonthKey),
    Done,
}

struct Cursor {
    source: Arc<dyn ArchiveSource>,
    username: String,
    window: usize,
    policy: MonthFailurePolicy,
    step: Step,
    pending: VecDeque<MonthKey>,
    collected: Vec<MatchRecord>,
    succeeded: usize,
    last_error: Option<ServiceError>,
}

impl Cursor {
    async fn advance(&mut self) -> Option<AggregationEvent> {
        // Any path that does not set a new step ends the stream.
        match std::mem::replace(&mut self.step, Step::Done) {
            Step::AnnounceIndex => {
                self.step = Step::LoadIndex;
                Some(AggregationEvent::Status(format!(
                    "Fetching archives for {}...",
                    self.username
                )))
            }
            Step::LoadIndex => {
                let index = match self.source.fetch_archive_index(&self.username).await {
                    Ok(index) => index,
                    Err(error) => return Some(AggregationEvent::Failed(error)),
                };
                let months = match select_recent_months(&index, self.window) {
                    Ok(months) => months.to_vec(),
                    Err(SelectionError::EmptyArchive) => {
                        return Some(AggregationEvent::Failed(ServiceError::EmptyArchive {
                            username: self.username.clone(),
                        }))
                    }
                };
                self.pending = months.iter().copied().collect();
                self.step = Step::AnnounceMonth;
                Some(AggregationEvent::IndexLoaded { months })
            }
            Step::AnnounceMonth => match self.pending.pop_front() {
                Some(month) => {
                    self.step = Step::LoadMonth(month);
                    Some(AggregationEvent::Status(format!(
                        "Fetching games from {month}..."
                    )))
                }
                None => Some(self.finish()),
            },
            Step::LoadMonth(month) => {
                match self.source.fetch_month(&self.username, month).await {
                    Ok(records) => {
                        let games = records.len();
                        self.collected.extend(records);
                        self.succeeded += 1;
                        self.step = Step::AnnounceMonth;
                        Some(AggregationEvent::MonthFetched { month, games })
                    }
                    Err(error) => match self.policy {
                        MonthFailurePolicy::Abort => Some(AggregationEvent::Failed(error)),
                        MonthFailurePolicy::SkipFailed => {
                            self.last_error = Some(error.clone());
                            self.step = Step::AnnounceMonth;
                            Some(AggregationEvent::MonthSkipped { month, error })
                        }
                    },
                }
            }
            Step::Done => None,
        }
    }

    fn finish(&mut self) -> AggregationEvent {
        if self.succeeded == 0 {
            if let Some(error) = self.last_error.take() {
                return AggregationEvent::Failed(error);
            }
        }
        let mut records = std::mem::take(&mut self.collected);
        merge_by_end_time(&mut records);
        AggregationEvent::Completed(records)
    }
}
