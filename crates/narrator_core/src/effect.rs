#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start cycling status phrases.
    StartNarration,
    /// Stop cycling status phrases. Emitted on every exit from `Processing`.
    StopNarration,
    SubmitGeneration(crate::GenerationRequest),
    ArtifactReady(crate::GenerationResult),
    ReportError(String),
    Download { url: String, filename: String },
}
