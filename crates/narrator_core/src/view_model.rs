use crate::{RequestId, StateKind};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkflowView {
    pub state: StateKind,
    pub progress: u8,
    pub request_id: Option<RequestId>,
    pub artifact_url: Option<String>,
    pub download_filename: Option<String>,
    pub last_error: Option<String>,
    pub dirty: bool,
}
