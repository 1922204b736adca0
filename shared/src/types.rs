//! Core shared types and identifiers
//!
//! The platform data model as this system sees it: containers, sessions,
//! analyses, files, gears and jobs. Records derive serde traits directly so
//! the REST adapter can move them across the wire without a parallel DTO
//! layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of a platform container (project, subject, session, ...)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Kind of platform container an id refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    Group,
    Project,
    Subject,
    Session,
    Acquisition,
    Analysis,
    /// Container kinds this system has no use for
    #[serde(other)]
    Other,
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerType::Group => write!(f, "group"),
            ContainerType::Project => write!(f, "project"),
            ContainerType::Subject => write!(f, "subject"),
            ContainerType::Session => write!(f, "session"),
            ContainerType::Acquisition => write!(f, "acquisition"),
            ContainerType::Analysis => write!(f, "analysis"),
            ContainerType::Other => write!(f, "other"),
        }
    }
}

/// Lifecycle state of a platform job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Complete,
    Failed,
    Cancelled,
    /// States the platform may add that this system does not interpret
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Whether the job can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Complete | JobState::Failed | JobState::Cancelled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Running => write!(f, "running"),
            JobState::Complete => write!(f, "complete"),
            JobState::Failed => write!(f, "failed"),
            JobState::Cancelled => write!(f, "cancelled"),
            JobState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Identity of the gear an analysis ran
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearInfo {
    pub name: String,
    pub version: String,
}

/// An installed gear, resolvable through the platform's gear registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearRecord {
    pub id: String,
    pub name: String,
    pub version: String,
}

/// A prior gear execution attached to a session or acquisition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: ContainerId,
    pub label: String,
    /// None for analyses that carry no gear identity (manual uploads);
    /// these never match any gear query.
    #[serde(default)]
    pub gear_info: Option<GearInfo>,
    /// None when the platform exposes no job for the analysis; such
    /// analyses count as satisfied wherever their gear matches.
    #[serde(default)]
    pub job_state: Option<JobState>,
}

/// A file visible in a container listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// Reference to a named file within a container, used as a job input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub container: ContainerId,
    pub name: String,
}

/// A data-collection session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: ContainerId,
    pub label: String,
    pub subject_label: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Parent containers by kind ("project", "subject", "group").
    #[serde(default)]
    pub parents: HashMap<String, ContainerId>,
    /// Free-form metadata; the completeness map lives under
    /// [`SessionRecord::COMPLETENESS_KEY`].
    #[serde(default)]
    pub info: HashMap<String, serde_json::Value>,
    pub created: DateTime<Utc>,
}

impl SessionRecord {
    /// Info key holding the completeness map (tag -> bool).
    pub const COMPLETENESS_KEY: &'static str = "COMPLETENESS";

    /// Whether the session carries a completeness map at all.
    pub fn has_completeness_map(&self) -> bool {
        self.info
            .get(Self::COMPLETENESS_KEY)
            .is_some_and(|v| v.is_object())
    }

    /// Value of one completeness flag. None when the map or the key is
    /// absent, or the stored value is not a boolean; callers treat all of
    /// those as "not satisfied".
    pub fn completeness_flag(&self, tag: &str) -> Option<bool> {
        self.info
            .get(Self::COMPLETENESS_KEY)?
            .as_object()?
            .get(tag)
            .and_then(|v| v.as_bool())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A project container
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ContainerId,
    pub label: String,
}

/// A child acquisition of a session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionRecord {
    pub id: ContainerId,
    pub label: String,
}

/// Handle of a submitted job
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to submit one gear job
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub gear_id: String,
    pub analysis_label: String,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub inputs: HashMap<String, FileRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Container the resulting analysis is attached to.
    pub destination: ContainerId,
}
