use std::fmt;

use crate::view_model::WorkflowView;
use crate::{GenerationRequest, GenerationResult, RequestId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Config,
    /// Request is being built; never observable between two `update` calls.
    Submitting,
    Processing(GenerationRequest),
    Success(GenerationResult),
}

impl WorkflowState {
    pub fn kind(&self) -> StateKind {
        match self {
            WorkflowState::Config => StateKind::Config,
            WorkflowState::Submitting => StateKind::Submitting,
            WorkflowState::Processing(_) => StateKind::Processing,
            WorkflowState::Success(_) => StateKind::Success,
        }
    }
}

/// Payload-free mirror of [`WorkflowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateKind {
    #[default]
    Config,
    Submitting,
    Processing,
    Success,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Config => "configuring",
            StateKind::Submitting => "submitting",
            StateKind::Processing => "processing",
            StateKind::Success => "finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowMachine {
    state: WorkflowState,
    progress: u8,
    last_error: Option<String>,
    next_request_id: RequestId,
    dirty: bool,
}

impl Default for WorkflowMachine {
    fn default() -> Self {
        Self {
            state: WorkflowState::Config,
            progress: 0,
            last_error: None,
            next_request_id: 1,
            dirty: false,
        }
    }
}

impl WorkflowMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn artifact(&self) -> Option<&GenerationResult> {
        match &self.state {
            WorkflowState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn outstanding_request(&self) -> Option<&GenerationRequest> {
        match &self.state {
            WorkflowState::Processing(request) => Some(request),
            _ => None,
        }
    }

    pub fn view(&self) -> WorkflowView {
        let artifact = self.artifact();
        WorkflowView {
            state: self.kind(),
            progress: self.progress,
            request_id: self.outstanding_request().map(|request| request.request_id),
            artifact_url: artifact.map(|result| result.artifact_url.clone()),
            download_filename: artifact.map(GenerationResult::suggested_filename),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn enter(&mut self, state: WorkflowState) {
        if self.state != state {
            self.state = state;
            self.dirty = true;
        }
    }

    pub(crate) fn set_progress(&mut self, progress: u8) {
        if self.progress != progress {
            self.progress = progress;
            self.dirty = true;
        }
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        if self.last_error != error {
            self.last_error = error;
            self.dirty = true;
        }
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }
}
