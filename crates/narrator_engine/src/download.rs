use std::path::PathBuf;
use std::sync::Arc;

use futures_util::StreamExt;
use narrator_logging::{narrator_info, narrator_warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::{sanitize_filename, AtomicFileWriter, EngineEvent, EngineSettings, PersistError, ProgressSink};

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("artifact larger than {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Saves finished artifacts into the output directory.
#[derive(Clone)]
pub struct Downloader {
    http: reqwest::Client,
    writer: AtomicFileWriter,
    max_bytes: u64,
    runtime: Handle,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl Downloader {
    pub fn new(settings: &EngineSettings, runtime: Handle) -> Result<Self, DownloadError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| DownloadError::Network(err.to_string()))?;
        Ok(Self {
            http,
            writer: AtomicFileWriter::new(settings.output_dir.clone()),
            max_bytes: settings.max_download_bytes,
            runtime,
            sink: None,
        })
    }

    /// Reports each finished download as [`EngineEvent::DownloadFinished`].
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Starts saving `url` as `filename` and returns immediately.
    ///
    /// Failures are logged, never retried. The handle resolves to the saved
    /// path and may be dropped.
    pub fn download(&self, url: impl Into<String>, filename: impl Into<String>) -> JoinHandle<Option<PathBuf>> {
        let this = self.clone();
        let url = url.into();
        let filename = sanitize_filename(&filename.into());
        self.runtime.spawn(async move {
            let path = match this.save(&url, &filename).await {
                Ok(path) => {
                    narrator_info!("Saved {} to {}", url, path.display());
                    Some(path)
                }
                Err(err) => {
                    narrator_warn!("Could not save {} as {}: {}", url, filename, err);
                    None
                }
            };
            if let Some(sink) = &this.sink {
                sink.emit(EngineEvent::DownloadFinished {
                    filename,
                    path: path.clone(),
                });
            }
            path
        })
    }

    async fn save(&self, url: &str, filename: &str) -> Result<PathBuf, DownloadError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| DownloadError::Network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(DownloadError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| DownloadError::Network(err.to_string()))?;
            if bytes.len() as u64 + chunk.len() as u64 > self.max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes: self.max_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(self.writer.write(filename, &bytes)?)
    }
}
