use crate::{RequestId, StateKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("you must be logged in to generate commentary")]
    MissingAuth,
    #[error("a generation request is already in flight")]
    RequestInFlight,
    #[error("{event} is not valid while {state}")]
    InvalidTransition {
        state: StateKind,
        event: &'static str,
    },
    #[error("response for request {received} does not match outstanding request {expected}")]
    StaleResponse {
        expected: RequestId,
        received: RequestId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("archive index is empty")]
    EmptyArchive,
}
