//! Trait definitions with mockall annotations for testing
//!
//! The collaborator surface of the remote data platform, extracted into
//! traits for dependency injection. The engine only ever talks to the
//! platform through [`PlatformClient`], so every evaluation path can be
//! exercised against mocks or an in-memory fake.

use chrono::NaiveDate;
use thiserror::Error;

use shared::{
    AnalysisRecord, ContainerId, ContainerType, FileEntry, GearRecord, JobId, JobRequest,
    JobState, ProjectRecord, SessionRecord,
};

/// Errors surfaced by a platform client implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Failed to decode platform response: {message}")]
    Decode { message: String },
}

impl PlatformError {
    /// Transient failures are worth retrying with a bounded backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            PlatformError::Network { .. } => true,
            PlatformError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Error when a required platform credential is missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCredential {
    pub key_name: String,
    pub message: String,
}

/// Connection parameters for the platform API
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_url: String,
    pub api_key: String,
}

/// Credential source abstraction for dependency injection
#[mockall::automock]
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Retrieve validated platform credentials.
    async fn get_credentials(&self) -> Result<Credentials, MissingCredential>;
}

/// Client surface of the remote data platform
///
/// Each method is a thin, single-purpose query or command; all sequencing
/// and decision logic stays in the engine and core modules.
#[mockall::automock]
#[async_trait::async_trait]
pub trait PlatformClient: Send + Sync {
    /// Sessions created on or after the given date.
    async fn find_sessions_created_after(
        &self,
        cutoff: NaiveDate,
    ) -> PlatformResult<Vec<SessionRecord>>;

    async fn get_session(&self, id: &ContainerId) -> PlatformResult<SessionRecord>;

    async fn get_project(&self, id: &ContainerId) -> PlatformResult<ProjectRecord>;

    /// Kind of container an id refers to.
    async fn container_type(&self, id: &ContainerId) -> PlatformResult<ContainerType>;

    /// Analyses attached to the session container itself.
    async fn session_analyses(&self, id: &ContainerId) -> PlatformResult<Vec<AnalysisRecord>>;

    /// Flattened analyses of all child acquisitions of the session.
    async fn acquisition_analyses(&self, id: &ContainerId)
        -> PlatformResult<Vec<AnalysisRecord>>;

    /// File listing of any container (project, session, analysis, ...).
    async fn list_files(&self, id: &ContainerId) -> PlatformResult<Vec<FileEntry>>;

    /// Raw contents of a named file on a container.
    async fn read_file(&self, id: &ContainerId, name: &str) -> PlatformResult<Vec<u8>>;

    /// Resolve an installed gear by name and optional exact version.
    async fn lookup_gear<'a>(&self, name: &str, version: Option<&'a str>)
        -> PlatformResult<GearRecord>;

    async fn submit_job(&self, request: &JobRequest) -> PlatformResult<JobId>;

    async fn get_job_state(&self, id: &JobId) -> PlatformResult<JobState>;
}
