use std::path::PathBuf;
use std::time::Duration;

use crate::MonthFailurePolicy;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";

/// Months fetched per aggregation unless configured otherwise.
pub const DEFAULT_ARCHIVE_WINDOW: usize = 3;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Generation blocks server side until the audio exists.
    pub generation_timeout: Duration,
    pub archive_window: usize,
    pub month_failure: MonthFailurePolicy,
    pub narration_interval: Duration,
    pub output_dir: PathBuf,
    pub max_download_bytes: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(600),
            archive_window: DEFAULT_ARCHIVE_WINDOW,
            month_failure: MonthFailurePolicy::Abort,
            narration_interval: Duration::from_secs(4),
            output_dir: PathBuf::from("output"),
            max_download_bytes: 200 * 1024 * 1024,
        }
    }
}
