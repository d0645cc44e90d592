//! Narrator core: archive selection, merge ordering and the generation
//! workflow state machine. Pure; all IO lives in `narrator_engine`.
mod effect;
mod error;
mod msg;
mod narration;
mod record;
mod request;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{SelectionError, TransitionError};
pub use msg::Msg;
pub use narration::{COMPLETE_PROGRESS, STATUS_PHRASES, SUBMITTED_PROGRESS};
pub use record::{
    merge_by_end_time, select_recent_months, ArchiveIndex, MatchRecord, MonthKey, Outcome,
    PlayerSide,
};
pub use request::{
    ArtifactStatus, CommentaryConfig, GenerationRequest, GenerationResult, Language, RequestId,
    UnknownLanguage, VoiceConfig,
};
pub use state::{StateKind, WorkflowMachine, WorkflowState};
pub use update::update;
pub use view_model::WorkflowView;
