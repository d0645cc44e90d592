use std::sync::{Arc, Mutex};
use std::time::Duration;

use narrator_core::{
    update, CommentaryConfig, Effect, GenerationRequest, MatchRecord, Msg, TransitionError,
    WorkflowMachine, WorkflowView,
};
use narrator_logging::{narrator_debug, narrator_info, narrator_warn};
use tokio::runtime::Handle;

use crate::narration::lock;
use crate::{Downloader, EngineEvent, ProgressSimulator, ProgressSink, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub artifact_url: String,
    pub notice: Option<String>,
}

/// Produces narrated audio for a game.
#[async_trait::async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationOutcome, ServiceError>;
}

/// Reports who is signed in. The workflow only ever asks for the id.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id: user_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self::new(Some(user_id.into()))
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<String> {
        self.user_id.clone()
    }
}

#[derive(Clone)]
pub struct WorkflowOptions {
    pub narration_interval: Duration,
    pub downloader: Option<Downloader>,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            narration_interval: Duration::from_secs(4),
            downloader: None,
        }
    }
}

/// Runs the generation state machine against real services.
///
/// Every effect the machine emits is executed while its lock is held, so
/// narration is started and stopped in the same step as the state change
/// that calls for it.
#[derive(Clone)]
pub struct GenerationWorkflow {
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    service: Arc<dyn GenerationService>,
    identity: Arc<dyn IdentityProvider>,
    sink: Arc<dyn ProgressSink>,
    downloader: Option<Downloader>,
    runtime: Handle,
}

struct Inner {
    machine: WorkflowMachine,
    narration: ProgressSimulator,
}

impl GenerationWorkflow {
    pub fn new(
        service: Arc<dyn GenerationService>,
        identity: Arc<dyn IdentityProvider>,
        sink: Arc<dyn ProgressSink>,
        runtime: Handle,
        options: WorkflowOptions,
    ) -> Self {
        let narration =
            ProgressSimulator::generation(options.narration_interval, Arc::clone(&sink), runtime.clone());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    machine: WorkflowMachine::new(),
                    narration,
                }),
                service,
                identity,
                sink,
                downloader: options.downloader,
                runtime,
            }),
        }
    }

    /// Submits `record` for commentary. Returns once the request is in flight;
    /// the outcome arrives later through the sink.
    pub fn start_generation(
        &self,
        record: MatchRecord,
        config: CommentaryConfig,
    ) -> Result<(), TransitionError> {
        let user_id = self.shared.identity.current_user();
        self.shared.dispatch(Msg::StartGeneration {
            record,
            config,
            user_id,
        })
    }

    /// Dismisses the result (or the configuration). Refused while a request is in flight.
    pub fn close(&self) -> Result<(), TransitionError> {
        self.shared.dispatch(Msg::Close)
    }

    pub fn download(&self) -> Result<(), TransitionError> {
        self.shared.dispatch(Msg::DownloadRequested)
    }

    pub fn view(&self) -> WorkflowView {
        lock(&self.shared.inner).machine.view()
    }

    pub fn narration(&self) -> Option<String> {
        lock(&self.shared.inner).narration.current_phrase()
    }

    pub fn is_narrating(&self) -> bool {
        lock(&self.shared.inner).narration.is_running()
    }
}

impl Shared {
    fn dispatch(self: &Arc<Self>, msg: Msg) -> Result<(), TransitionError> {
        let mut outbox = Vec::new();
        {
            let mut inner = lock(&self.inner);
            let effects = update(&mut inner.machine, msg).map_err(|err| {
                narrator_debug!("Workflow rejected event: {}", err);
                err
            })?;
            for effect in effects {
                outbox.extend(self.execute(&mut inner, effect));
            }
        }
        // Outcome events go out with the lock released, so a sink may read the workflow.
        for event in outbox {
            self.sink.emit(event);
        }
        Ok(())
    }

    /// Runs `effect`; an event it produces is returned for the caller to emit.
    fn execute(self: &Arc<Self>, inner: &mut Inner, effect: Effect) -> Option<EngineEvent> {
        match effect {
            Effect::StartNarration => inner.narration.start(),
            Effect::StopNarration => inner.narration.stop(),
            Effect::SubmitGeneration(request) => self.submit(request),
            Effect::ArtifactReady(result) => {
                narrator_info!(
                    "Commentary ready for request {}: {}",
                    result.request_id,
                    result.artifact_url
                );
                if let Some(notice) = &result.notice {
                    narrator_warn!("Backend notice: {}", notice);
                }
                return Some(EngineEvent::GenerationSucceeded(result));
            }
            Effect::ReportError(message) => {
                narrator_warn!("Generation failed: {}", message);
                return Some(EngineEvent::GenerationFailed { message });
            }
            Effect::Download { url, filename } => match &self.downloader {
                Some(downloader) => {
                    // Best effort; the outcome is reported by the downloader.
                    drop(downloader.download(url, filename));
                }
                None => narrator_warn!("No downloader configured; not saving {}", filename),
            },
        }
        None
    }

    fn submit(self: &Arc<Self>, request: GenerationRequest) {
        let shared = Arc::clone(self);
        narrator_info!(
            "Submitting generation request {} ({} vs {}, {})",
            request.request_id,
            request.player_white,
            request.player_black,
            request.language
        );
        self.runtime.spawn(async move {
            let request_id = request.request_id;
            let msg = match shared.service.generate(&request).await {
                Ok(outcome) => Msg::RequestSucceeded {
                    request_id,
                    artifact_url: outcome.artifact_url,
                    notice: outcome.notice,
                },
                Err(error) => Msg::RequestFailed {
                    request_id,
                    reason: error.to_string(),
                },
            };
            if let Err(err) = shared.dispatch(msg) {
                narrator_warn!("Dropping result of request {}: {}", request_id, err);
            }
        });
    }
}
