use std::sync::{mpsc, Arc};
use std::thread;

use narrator_core::{CommentaryConfig, MatchRecord};
use narrator_logging::narrator_debug;

use crate::sink::ChannelProgressSink;
use crate::{
    ArchiveFetcher, BackendClient, DownloadError, Downloader, EngineEvent, EngineSettings,
    GenerationWorkflow, IdentityProvider, ProgressSink, ServiceError, WorkflowOptions,
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] ServiceError),
    #[error(transparent)]
    Downloader(#[from] DownloadError),
}

enum EngineCommand {
    FetchGames { username: String },
    StartGeneration {
        record: Box<MatchRecord>,
        config: CommentaryConfig,
    },
    Close,
    Download,
    DownloadFile { url: String, filename: String },
    ListRecordings { user_id: String },
}

/// Synchronous front door to the engine. Work runs on a dedicated thread;
/// results come back as [`EngineEvent`]s through [`try_recv`](Self::try_recv).
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(
        settings: EngineSettings,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let runtime = tokio::runtime::Runtime::new()?;
        let client = Arc::new(BackendClient::new(&settings)?);
        let sink: Arc<dyn ProgressSink> = Arc::new(ChannelProgressSink::new(event_tx));
        let downloader =
            Downloader::new(&settings, runtime.handle().clone())?.with_sink(Arc::clone(&sink));
        let workflow_downloader = downloader.clone();

        let fetcher = ArchiveFetcher::new(client.clone())
            .with_window(settings.archive_window)
            .with_failure_policy(settings.month_failure);
        let workflow = GenerationWorkflow::new(
            client.clone(),
            identity,
            Arc::clone(&sink),
            runtime.handle().clone(),
            WorkflowOptions {
                narration_interval: settings.narration_interval,
                downloader: Some(workflow_downloader),
            },
        );

        thread::spawn(move || {
            let engine = EngineLoop {
                runtime,
                client,
                downloader,
                fetcher,
                workflow,
                sink,
            };
            while let Ok(command) = cmd_rx.recv() {
                engine.handle(command);
            }
            narrator_debug!("Engine command channel closed; shutting down");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn fetch_games(&self, username: impl Into<String>) {
        self.send(EngineCommand::FetchGames {
            username: username.into(),
        });
    }

    pub fn start_generation(&self, record: MatchRecord, config: CommentaryConfig) {
        self.send(EngineCommand::StartGeneration {
            record: Box::new(record),
            config,
        });
    }

    pub fn close(&self) {
        self.send(EngineCommand::Close);
    }

    pub fn download(&self) {
        self.send(EngineCommand::Download);
    }

    /// Saves any artifact, such as a past recording, into the output directory.
    /// Finishes with [`EngineEvent::DownloadFinished`].
    pub fn download_file(&self, url: impl Into<String>, filename: impl Into<String>) {
        self.send(EngineCommand::DownloadFile {
            url: url.into(),
            filename: filename.into(),
        });
    }

    pub fn list_recordings(&self, user_id: impl Into<String>) {
        self.send(EngineCommand::ListRecordings {
            user_id: user_id.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    fn send(&self, command: EngineCommand) {
        // Only fails once the engine thread is gone.
        let _ = self.cmd_tx.send(command);
    }
}

struct EngineLoop {
    runtime: tokio::runtime::Runtime,
    client: Arc<BackendClient>,
    downloader: Downloader,
    fetcher: ArchiveFetcher,
    workflow: GenerationWorkflow,
    sink: Arc<dyn ProgressSink>,
}

impl EngineLoop {
    fn handle(&self, command: EngineCommand) {
        match command {
            EngineCommand::FetchGames { username } => {
                let fetcher = self.fetcher.clone();
                let sink = Arc::clone(&self.sink);
                self.runtime.spawn(async move {
                    let result = fetcher.aggregate(&username, sink.as_ref()).await;
                    sink.emit(EngineEvent::GamesFetched { username, result });
                });
            }
            EngineCommand::StartGeneration { record, config } => {
                self.report(self.workflow.start_generation(*record, config));
            }
            EngineCommand::Close => self.report(self.workflow.close()),
            EngineCommand::Download => self.report(self.workflow.download()),
            EngineCommand::DownloadFile { url, filename } => {
                // The outcome reaches the sink as DownloadFinished.
                drop(self.downloader.download(url, filename));
            }
            EngineCommand::ListRecordings { user_id } => {
                let client = Arc::clone(&self.client);
                let sink = Arc::clone(&self.sink);
                self.runtime.spawn(async move {
                    let result = client.list_recordings(&user_id).await;
                    sink.emit(EngineEvent::RecordingsListed(result));
                });
            }
        }
    }

    fn report(&self, outcome: Result<(), narrator_core::TransitionError>) {
        if let Err(err) = outcome {
            self.sink.emit(EngineEvent::Rejected(err));
        }
    }
}
