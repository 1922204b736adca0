//! In-memory platform fake and scenario builder
//!
//! [`FakePlatform`] implements [`PlatformClient`] over shared mutable state
//! so whole engine runs can execute against it. Submitting a job attaches a
//! pending analysis to the destination session, which is how a second pass
//! observes the first one.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use autoworkflow::{EngineConfig, PlatformClient, PlatformError, WorkflowEngine};
use autoworkflow::traits::PlatformResult;
use shared::{
    AnalysisRecord, ContainerId, ContainerType, FileEntry, GearInfo, GearRecord, JobId,
    JobRequest, JobState, ProjectRecord, SessionRecord,
};

use super::fixtures::TestFixtures;

#[derive(Default)]
pub struct PlatformState {
    pub sessions: HashMap<ContainerId, SessionRecord>,
    pub session_order: Vec<ContainerId>,
    pub projects: HashMap<ContainerId, ProjectRecord>,
    pub container_types: HashMap<ContainerId, ContainerType>,
    pub session_analyses: HashMap<ContainerId, Vec<AnalysisRecord>>,
    pub acquisition_analyses: HashMap<ContainerId, Vec<AnalysisRecord>>,
    pub files: HashMap<ContainerId, Vec<FileEntry>>,
    pub file_contents: HashMap<(ContainerId, String), Vec<u8>>,
    pub gears: HashMap<String, GearRecord>,
    pub job_states: HashMap<JobId, JobState>,
    pub submitted: Vec<JobRequest>,
    /// Session ids whose `get_session` fails with a network error.
    pub failing_sessions: HashSet<ContainerId>,
    next_job: u32,
}

/// In-memory [`PlatformClient`] backed by [`PlatformState`]
#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<PlatformState>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap()
    }

    pub fn submitted(&self) -> Vec<JobRequest> {
        self.state().submitted.clone()
    }

    fn known_type(state: &PlatformState, id: &ContainerId) -> Option<ContainerType> {
        if let Some(kind) = state.container_types.get(id) {
            return Some(*kind);
        }
        if state.sessions.contains_key(id) {
            return Some(ContainerType::Session);
        }
        if state.projects.contains_key(id) {
            return Some(ContainerType::Project);
        }
        None
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn find_sessions_created_after(
        &self,
        cutoff: NaiveDate,
    ) -> PlatformResult<Vec<SessionRecord>> {
        let state = self.state();
        Ok(state
            .session_order
            .iter()
            .filter_map(|id| state.sessions.get(id))
            .filter(|s| s.created.date_naive() >= cutoff)
            .cloned()
            .collect())
    }

    async fn get_session(&self, id: &ContainerId) -> PlatformResult<SessionRecord> {
        let state = self.state();
        if state.failing_sessions.contains(id) {
            return Err(PlatformError::Network {
                message: "connection reset".to_string(),
            });
        }
        state
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
                kind: "session".to_string(),
                id: id.to_string(),
            })
    }

    async fn get_project(&self, id: &ContainerId) -> PlatformResult<ProjectRecord> {
        self.state()
            .projects
            .get(id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
                kind: "project".to_string(),
                id: id.to_string(),
            })
    }

    async fn container_type(&self, id: &ContainerId) -> PlatformResult<ContainerType> {
        let state = self.state();
        Self::known_type(&state, id).ok_or_else(|| PlatformError::NotFound {
            kind: "container".to_string(),
            id: id.to_string(),
        })
    }

    async fn session_analyses(&self, id: &ContainerId) -> PlatformResult<Vec<AnalysisRecord>> {
        Ok(self.state().session_analyses.get(id).cloned().unwrap_or_default())
    }

    async fn acquisition_analyses(
        &self,
        id: &ContainerId,
    ) -> PlatformResult<Vec<AnalysisRecord>> {
        Ok(self
            .state()
            .acquisition_analyses
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_files(&self, id: &ContainerId) -> PlatformResult<Vec<FileEntry>> {
        Ok(self.state().files.get(id).cloned().unwrap_or_default())
    }

    async fn read_file(&self, id: &ContainerId, name: &str) -> PlatformResult<Vec<u8>> {
        self.state()
            .file_contents
            .get(&(id.clone(), name.to_string()))
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
                kind: "file".to_string(),
                id: format!("{id}/{name}"),
            })
    }

    async fn lookup_gear<'a>(
        &self,
        name: &str,
        version: Option<&'a str>,
    ) -> PlatformResult<GearRecord> {
        let state = self.state();
        let gear = state.gears.get(name).ok_or_else(|| PlatformError::NotFound {
            kind: "gear".to_string(),
            id: name.to_string(),
        })?;
        if let Some(version) = version {
            if gear.version != version {
                return Err(PlatformError::NotFound {
                    kind: "gear".to_string(),
                    id: format!("{name}/{version}"),
                });
            }
        }
        Ok(gear.clone())
    }

    async fn submit_job(&self, request: &JobRequest) -> PlatformResult<JobId> {
        let mut state = self.state();
        state.next_job += 1;
        let job_id = JobId::new(format!("job-{}", state.next_job));

        // Mirror the platform: a submitted job shows up as a pending
        // analysis on its destination container.
        let gear_info = state
            .gears
            .values()
            .find(|g| g.id == request.gear_id)
            .map(|g| GearInfo {
                name: g.name.clone(),
                version: g.version.clone(),
            });
        let analysis = AnalysisRecord {
            id: ContainerId::new(format!("an-{job_id}")),
            label: request.analysis_label.clone(),
            gear_info,
            job_state: Some(JobState::Pending),
        };
        state
            .session_analyses
            .entry(request.destination.clone())
            .or_default()
            .push(analysis);

        state.job_states.insert(job_id.clone(), JobState::Pending);
        state.submitted.push(request.clone());
        Ok(job_id)
    }

    async fn get_job_state(&self, id: &JobId) -> PlatformResult<JobState> {
        self.state()
            .job_states
            .get(id)
            .copied()
            .ok_or_else(|| PlatformError::NotFound {
                kind: "job".to_string(),
                id: id.to_string(),
            })
    }
}

/// Assembles a populated [`FakePlatform`] and an engine around it.
///
/// Starts from the standard fixtures: one project carrying the template
/// file, one session parented to it, and the "mriqc" gear installed.
pub struct ScenarioBuilder {
    platform: FakePlatform,
    config: EngineConfig,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        let platform = FakePlatform::new();
        {
            let mut state = platform.state();
            let project = TestFixtures::project();
            let session = TestFixtures::session();
            state.session_order.push(session.id.clone());
            state.sessions.insert(session.id.clone(), session);
            state.projects.insert(project.id.clone(), project);
            for gear in ["mriqc", "dcm2niix"] {
                state
                    .gears
                    .insert(gear.to_string(), TestFixtures::gear(gear, "1.0.2"));
            }
        }
        let builder = Self {
            platform,
            config: EngineConfig::default(),
        };
        builder.with_template(TestFixtures::simple_template())
    }

    /// Replace the template stored on the fixture project.
    pub fn with_template(self, template: Value) -> Self {
        let project_id = ContainerId::from(TestFixtures::PROJECT_ID);
        let name = TestFixtures::TEMPLATE_NAME.to_string();
        {
            let mut state = self.platform.state();
            let bytes = serde_json::to_vec(&template).unwrap();
            let files = state.files.entry(project_id.clone()).or_default();
            if !files.iter().any(|f| f.name == name) {
                files.push(TestFixtures::file(&name));
            }
            state.file_contents.insert((project_id, name), bytes);
        }
        self
    }

    /// Remove the template file entirely.
    pub fn without_template(self) -> Self {
        let project_id = ContainerId::from(TestFixtures::PROJECT_ID);
        {
            let mut state = self.platform.state();
            state.files.remove(&project_id);
            state
                .file_contents
                .remove(&(project_id, TestFixtures::TEMPLATE_NAME.to_string()));
        }
        self
    }

    pub fn with_project_file(self, name: &str) -> Self {
        let project_id = ContainerId::from(TestFixtures::PROJECT_ID);
        self.platform
            .state()
            .files
            .entry(project_id)
            .or_default()
            .push(TestFixtures::file(name));
        self
    }

    pub fn with_session_analysis(self, analysis: AnalysisRecord) -> Self {
        self.platform
            .state()
            .session_analyses
            .entry(ContainerId::from(TestFixtures::SESSION_ID))
            .or_default()
            .push(analysis);
        self
    }

    pub fn with_session(self, session: SessionRecord) -> Self {
        {
            let mut state = self.platform.state();
            state.session_order.push(session.id.clone());
            state.sessions.insert(session.id.clone(), session);
        }
        self
    }

    /// Rewrite the fixture session in place.
    pub fn map_session(self, f: impl FnOnce(&mut SessionRecord)) -> Self {
        {
            let mut state = self.platform.state();
            let session = state
                .sessions
                .get_mut(&ContainerId::from(TestFixtures::SESSION_ID))
                .expect("fixture session present");
            f(session);
        }
        self
    }

    pub fn failing_session(self, id: &str) -> Self {
        self.platform
            .state()
            .failing_sessions
            .insert(ContainerId::from(id));
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.config.dry_run = true;
        self
    }

    pub fn build(self) -> (WorkflowEngine<FakePlatform>, FakePlatform) {
        let handle = self.platform.clone();
        (WorkflowEngine::new(self.platform, self.config), handle)
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}
