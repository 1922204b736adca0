//! Thin REST adapter for the remote data platform
//!
//! Maps the [`PlatformClient`](crate::traits::PlatformClient) trait onto the
//! platform's HTTP API. This is pure transport glue: every decision about
//! what to run lives in the core modules, this type only shuttles records
//! back and forth. Records deserialize straight off the wire, so there is no
//! parallel DTO layer to keep in sync.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use shared::{
    AcquisitionRecord, AnalysisRecord, ContainerId, ContainerType, FileEntry, GearRecord, JobId,
    JobRequest, JobState, ProjectRecord, SessionRecord,
};

use crate::services::retry::{with_retry, RetryPolicy};
use crate::traits::{Credentials, PlatformClient, PlatformError, PlatformResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Container metadata as returned by the generic container endpoint
#[derive(Debug, Deserialize)]
struct ContainerSummary {
    container_type: ContainerType,
}

/// Response of a job submission
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: JobId,
}

/// Job metadata; only the state is of interest here
#[derive(Debug, Deserialize)]
struct JobStatus {
    state: JobState,
}

/// Real platform client speaking the platform's REST API
pub struct RestPlatformClient {
    http: Client,
    base: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl RestPlatformClient {
    pub fn new(credentials: &Credentials) -> PlatformResult<Self> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let raw = if credentials.api_url.ends_with('/') {
            credentials.api_url.clone()
        } else {
            format!("{}/", credentials.api_url)
        };
        let base = Url::parse(&raw).map_err(|e| PlatformError::Decode {
            message: format!("invalid api url: {e}"),
        })?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlatformError::Network {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base,
            api_key: credentials.api_key.clone(),
            retry: RetryPolicy::default(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> PlatformResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PlatformError::Decode {
                message: "api url cannot be a base".to_string(),
            })?
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> PlatformResult<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| PlatformError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Decode {
                message: e.to_string(),
            })
    }

    async fn fetch_file(&self, id: &ContainerId, name: &str) -> PlatformResult<Vec<u8>> {
        let url = self.endpoint(&["containers", id.as_str(), "files", name])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| PlatformError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(PlatformError::NotFound {
                kind: "file".to_string(),
                id: format!("{id}/{name}"),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let bytes = response.bytes().await.map_err(|e| PlatformError::Network {
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl PlatformClient for RestPlatformClient {
    async fn find_sessions_created_after(
        &self,
        cutoff: NaiveDate,
    ) -> PlatformResult<Vec<SessionRecord>> {
        let mut url = self.endpoint(&["sessions"])?;
        url.query_pairs_mut()
            .append_pair("filter", &format!("created>{}", cutoff.format("%Y-%m-%d")));
        self.get_json(url).await
    }

    async fn get_session(&self, id: &ContainerId) -> PlatformResult<SessionRecord> {
        let url = self.endpoint(&["sessions", id.as_str()])?;
        self.get_json(url).await
    }

    async fn get_project(&self, id: &ContainerId) -> PlatformResult<ProjectRecord> {
        let url = self.endpoint(&["projects", id.as_str()])?;
        self.get_json(url).await
    }

    async fn container_type(&self, id: &ContainerId) -> PlatformResult<ContainerType> {
        let url = self.endpoint(&["containers", id.as_str()])?;
        let summary: ContainerSummary = self.get_json(url).await?;
        Ok(summary.container_type)
    }

    async fn session_analyses(&self, id: &ContainerId) -> PlatformResult<Vec<AnalysisRecord>> {
        let url = self.endpoint(&["sessions", id.as_str(), "analyses"])?;
        self.get_json(url).await
    }

    async fn acquisition_analyses(
        &self,
        id: &ContainerId,
    ) -> PlatformResult<Vec<AnalysisRecord>> {
        let url = self.endpoint(&["sessions", id.as_str(), "acquisitions"])?;
        let acquisitions: Vec<AcquisitionRecord> = self.get_json(url).await?;

        // Flatten analyses across all child acquisitions. Slower than a
        // single query, but the platform offers no combined listing.
        let mut analyses = Vec::new();
        for acquisition in &acquisitions {
            let url = self.endpoint(&["acquisitions", acquisition.id.as_str(), "analyses"])?;
            let mut batch: Vec<AnalysisRecord> = self.get_json(url).await?;
            analyses.append(&mut batch);
        }
        Ok(analyses)
    }

    async fn list_files(&self, id: &ContainerId) -> PlatformResult<Vec<FileEntry>> {
        let url = self.endpoint(&["containers", id.as_str(), "files"])?;
        self.get_json(url).await
    }

    async fn read_file(&self, id: &ContainerId, name: &str) -> PlatformResult<Vec<u8>> {
        with_retry(self.retry, || self.fetch_file(id, name)).await
    }

    async fn lookup_gear<'a>(
        &self,
        name: &str,
        version: Option<&'a str>,
    ) -> PlatformResult<GearRecord> {
        let url = match version {
            Some(version) => self.endpoint(&["gears", "lookup", name, version])?,
            None => self.endpoint(&["gears", "lookup", name])?,
        };
        self.get_json(url).await
    }

    async fn submit_job(&self, request: &JobRequest) -> PlatformResult<JobId> {
        let url = self.endpoint(&["jobs", "add"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PlatformError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let submitted: SubmitResponse =
            response
                .json()
                .await
                .map_err(|e| PlatformError::Decode {
                    message: e.to_string(),
                })?;
        Ok(submitted.id)
    }

    async fn get_job_state(&self, id: &JobId) -> PlatformResult<JobState> {
        let url = self.endpoint(&["jobs", id.as_str()])?;
        let status: JobStatus = self.get_json(url).await?;
        Ok(status.state)
    }
}
