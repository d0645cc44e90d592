#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked for commentary on a game. `user_id` is whatever the
    /// identity provider reported, `None` when nobody is signed in.
    StartGeneration {
        record: crate::MatchRecord,
        config: crate::CommentaryConfig,
        user_id: Option<String>,
    },
    /// Generation service returned an artifact.
    RequestSucceeded {
        request_id: crate::RequestId,
        artifact_url: String,
        notice: Option<String>,
    },
    /// Generation service (or request construction) failed.
    RequestFailed {
        request_id: crate::RequestId,
        reason: String,
    },
    /// User dismissed the generation view.
    Close,
    /// User asked to save the finished artifact.
    DownloadRequested,
    NoOp,
}

impl Msg {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Msg::StartGeneration { .. } => "StartGeneration",
            Msg::RequestSucceeded { .. } => "RequestSucceeded",
            Msg::RequestFailed { .. } => "RequestFailed",
            Msg::Close => "Close",
            Msg::DownloadRequested => "DownloadRequested",
            Msg::NoOp => "NoOp",
        }
    }
}
