use narrator_core::{ArchiveIndex, GenerationRequest, MatchRecord, MonthKey};
use narrator_logging::{narrator_debug, narrator_warn};
use reqwest::{Response, StatusCode, Url};

use crate::wire::{
    ArchiveListBody, ErrorBody, GenerateBody, GenerateResponse, MonthBody, RecordingsBody,
};
use crate::{
    ArchiveSource, EngineSettings, GenerationOutcome, GenerationService, Recording, ServiceError,
};

/// HTTP client for the commentary backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    generation_timeout: std::time::Duration,
}

impl BackendClient {
    pub fn new(settings: &EngineSettings) -> Result<Self, ServiceError> {
        let base_url = Url::parse(settings.base_url.trim()).map_err(|err| {
            ServiceError::Network(format!("invalid backend url {}: {err}", settings.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::Network(format!(
                "backend url {base_url} cannot carry a path"
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::Network(err.to_string()))?;

        Ok(Self {
            http,
            base_url,
            generation_timeout: settings.generation_timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base always has a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<Response, ServiceError> {
        narrator_debug!("GET {}", url);
        self.http.get(url).send().await.map_err(map_reqwest_error)
    }

    pub async fn list_recordings(&self, user_id: &str) -> Result<Vec<Recording>, ServiceError> {
        let response = self.get(self.endpoint(&["recordings", user_id])).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::backend(
                Some(status.as_u16()),
                error_message(response).await,
            ));
        }
        let body: RecordingsBody = response.json().await.map_err(map_reqwest_error)?;
        Ok(body.into_recordings())
    }
}

#[async_trait::async_trait]
impl ArchiveSource for BackendClient {
    async fn fetch_archive_index(&self, username: &str) -> Result<ArchiveIndex, ServiceError> {
        let response = self.get(self.endpoint(&["archives", username])).await?;
        if !response.status().is_success() {
            narrator_debug!("Archive index for {} returned {}", username, response.status());
            return Err(ServiceError::UserNotFound {
                username: username.to_string(),
            });
        }

        let body: ArchiveListBody = response.json().await.map_err(map_reqwest_error)?;
        match (body.archives, body.error) {
            (Some(archives), _) => Ok(index_from_urls(&archives)),
            (None, Some(error)) => {
                narrator_debug!("Archive index for {} reported: {}", username, error);
                Err(ServiceError::UserNotFound {
                    username: username.to_string(),
                })
            }
            (None, None) => Ok(ArchiveIndex::default()),
        }
    }

    async fn fetch_month(
        &self,
        username: &str,
        month: MonthKey,
    ) -> Result<Vec<MatchRecord>, ServiceError> {
        let year = format!("{:04}", month.year);
        let month_number = format!("{:02}", month.month);
        let response = self
            .get(self.endpoint(&["games", username, &year, &month_number]))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::backend(
                Some(status.as_u16()),
                error_message(response).await,
            ));
        }

        let body: MonthBody = response.json().await.map_err(map_reqwest_error)?;
        match (body.games, body.error) {
            (Some(games), _) => Ok(games
                .into_iter()
                .map(|game| game.into_record(month))
                .collect()),
            (None, Some(error)) => Err(ServiceError::backend(Some(status.as_u16()), error)),
            (None, None) => Ok(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl GenerationService for BackendClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, ServiceError> {
        let url = self.endpoint(&["generate"]);
        narrator_debug!("POST {} request_id={}", url, request.request_id);
        let response = self
            .http
            .post(url)
            .timeout(self.generation_timeout)
            .json(&GenerateBody::from(request))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::backend(
                Some(status.as_u16()),
                error_message(response).await,
            ));
        }

        let body: GenerateResponse = response.json().await.map_err(map_reqwest_error)?;
        match body.audio_url.filter(|url| !url.trim().is_empty()) {
            Some(artifact_url) => Ok(GenerationOutcome {
                artifact_url,
                notice: body.error,
            }),
            None => Err(ServiceError::backend(
                Some(status.as_u16()),
                "No audio URL returned",
            )),
        }
    }
}

fn index_from_urls(archives: &[String]) -> ArchiveIndex {
    let months = archives
        .iter()
        .filter_map(|raw| {
            let month = MonthKey::from_archive_url(raw);
            if month.is_none() {
                narrator_warn!("Ignoring unrecognised archive entry {:?}", raw);
            }
            month
        })
        .collect();
    ArchiveIndex::new(months)
}

/// The `detail` field of an error body, or a generic message naming the status.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let fallback = generic_message(status);
    match response.text().await {
        Ok(text) => serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::message)
            .unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn generic_message(status: StatusCode) -> String {
    format!(
        "Backend error: {}",
        status.canonical_reason().unwrap_or(status.as_str())
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_decode() {
        return ServiceError::backend(
            err.status().map(|status| status.as_u16()),
            format!("invalid response body: {err}"),
        );
    }
    if err.is_timeout() {
        return ServiceError::Network(format!("timed out: {err}"));
    }
    ServiceError::Network(err.to_string())
}
