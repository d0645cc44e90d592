/// Status phrases cycled while a generation is in flight. They describe the
/// backend pipeline in order but are not driven by it.
pub const STATUS_PHRASES: [&str; 6] = [
    "Connecting to Stockfish Engine...",
    "Analyzing Board Positions...",
    "Sending Analysis to Gemini AI...",
    "Drafting Commentary Script...",
    "Synthesizing Voice Audio...",
    "Finalizing Audio File (Uploading to Cloud)...",
];

/// Progress shown as soon as a request is submitted.
pub const SUBMITTED_PROGRESS: u8 = 5;

pub const COMPLETE_PROGRESS: u8 = 100;
