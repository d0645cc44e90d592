use crate::{
    ArtifactStatus, CommentaryConfig, Effect, GenerationRequest, GenerationResult, MatchRecord,
    Msg, StateKind, TransitionError, WorkflowMachine, WorkflowState, COMPLETE_PROGRESS,
    SUBMITTED_PROGRESS,
};

/// Applies a message to the workflow and returns the effects to run.
///
/// A rejected message leaves `machine` exactly as it was.
pub fn update(machine: &mut WorkflowMachine, msg: Msg) -> Result<Vec<Effect>, TransitionError> {
    let event = msg.name();
    let state = machine.kind();
    let outstanding = machine
        .outstanding_request()
        .map(|request| request.request_id);

    match msg {
        Msg::StartGeneration {
            record,
            config,
            user_id,
        } => {
            match state {
                StateKind::Config => {}
                StateKind::Processing => return Err(TransitionError::RequestInFlight),
                StateKind::Submitting | StateKind::Success => {
                    return Err(TransitionError::InvalidTransition { state, event })
                }
            }
            let Some(user_id) = user_id else {
                return Err(TransitionError::MissingAuth);
            };
            Ok(submit(machine, record, config, user_id))
        }
        Msg::RequestSucceeded {
            request_id,
            artifact_url,
            notice,
        } => {
            let Some(expected) = outstanding else {
                return Err(TransitionError::InvalidTransition { state, event });
            };
            if expected != request_id {
                return Err(TransitionError::StaleResponse {
                    expected,
                    received: request_id,
                });
            }
            let result = match machine.state() {
                WorkflowState::Processing(request) => GenerationResult {
                    request_id,
                    artifact_url,
                    status: ArtifactStatus::Complete,
                    player_white: request.player_white.clone(),
                    player_black: request.player_black.clone(),
                    notice,
                },
                _ => return Err(TransitionError::InvalidTransition { state, event }),
            };
            machine.set_progress(COMPLETE_PROGRESS);
            machine.enter(WorkflowState::Success(result.clone()));
            Ok(vec![Effect::StopNarration, Effect::ArtifactReady(result)])
        }
        Msg::RequestFailed { request_id, reason } => match (state, outstanding) {
            (StateKind::Processing, Some(expected)) if expected != request_id => {
                Err(TransitionError::StaleResponse {
                    expected,
                    received: request_id,
                })
            }
            (StateKind::Processing, _) | (StateKind::Submitting, _) => Ok(fail(machine, reason)),
            _ => Err(TransitionError::InvalidTransition { state, event }),
        },
        Msg::Close => match state {
            StateKind::Config | StateKind::Success => {
                machine.set_progress(0);
                machine.set_error(None);
                machine.enter(WorkflowState::Config);
                Ok(Vec::new())
            }
            // No cancellation channel to the backend: the view stays open.
            StateKind::Processing => Err(TransitionError::RequestInFlight),
            StateKind::Submitting => Err(TransitionError::InvalidTransition { state, event }),
        },
        Msg::DownloadRequested => match machine.artifact() {
            Some(result) => Ok(vec![Effect::Download {
                url: result.artifact_url.clone(),
                filename: result.suggested_filename(),
            }]),
            None => Err(TransitionError::InvalidTransition { state, event }),
        },
        Msg::NoOp => Ok(Vec::new()),
    }
}

fn submit(
    machine: &mut WorkflowMachine,
    record: MatchRecord,
    config: CommentaryConfig,
    user_id: String,
) -> Vec<Effect> {
    machine.set_error(None);
    machine.enter(WorkflowState::Submitting);

    let request = GenerationRequest {
        request_id: machine.allocate_request_id(),
        pgn: record.pgn,
        language: config.language,
        voice: config.voice,
        user_id,
        player_white: record.white.username,
        player_black: record.black.username,
    };
    if let Some(problem) = request.problem() {
        return fail(machine, problem.to_string());
    }

    machine.set_progress(SUBMITTED_PROGRESS);
    machine.enter(WorkflowState::Processing(request.clone()));
    vec![Effect::StartNarration, Effect::SubmitGeneration(request)]
}

/// Shared exit edge for `Submitting` and `Processing` failures.
fn fail(machine: &mut WorkflowMachine, reason: String) -> Vec<Effect> {
    machine.set_progress(0);
    machine.set_error(Some(reason.clone()));
    machine.enter(WorkflowState::Config);
    vec![Effect::StopNarration, Effect::ReportError(reason)]
}
