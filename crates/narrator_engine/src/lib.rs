//! Narrator engine: backend IO, archive aggregation, narration and the
//! generation workflow runtime.
mod archive;
mod client;
mod download;
mod engine;
mod filename;
mod narration;
mod persist;
mod settings;
mod sink;
mod types;
mod wire;
mod workflow;

pub use archive::{AggregationEvent, ArchiveFetcher, ArchiveSource, MonthFailurePolicy};
pub use client::BackendClient;
pub use download::{DownloadError, Downloader};
pub use engine::{EngineError, EngineHandle};
pub use filename::sanitize_filename;
pub use narration::{ProgressSimulator, MIN_NARRATION_INTERVAL};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use settings::{EngineSettings, DEFAULT_ARCHIVE_WINDOW, DEFAULT_BASE_URL};
pub use sink::{ChannelProgressSink, ProgressSink};
pub use types::{EngineEvent, Recording, ServiceError};
pub use workflow::{
    GenerationOutcome, GenerationService, GenerationWorkflow, IdentityProvider, StaticIdentity,
    WorkflowOptions,
};
