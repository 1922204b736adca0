//! Workflow engine: walks sessions and dispatches rule-matched gear jobs
//!
//! Control flow per session: load the project's template, then for each rule
//! in template order run the existence check, the prerequisite evaluator,
//! the gates, the input resolver, and finally the dispatcher. Rules are
//! evaluated strictly in template order because later rules may declare
//! prerequisites on earlier ones. A failing stage skips the rule; a failing
//! session is logged and never aborts the batch.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{Local, Utc};
use tracing::{info, warn};

use shared::{
    logging::RunContext, session_debug, session_error, session_info, ContainerId, ContainerType,
    FileRef, JobId, JobRequest, ProjectRecord, SessionRecord,
};

use crate::core::{
    analysis_exists, evaluate_gates, find_analysis, match_slot, ExistenceQuery, GearSpec,
    MatchMode, Rule, RuleTemplate, RunSummary, SessionOutcome, SkipReason, SlotMatch,
    BLOCKING_STATUSES, COMPLETE_ONLY,
};
use crate::error::{WorkflowError, WorkflowResult};
use crate::traits::PlatformClient;

/// Timestamp suffix appended to every submitted analysis label. The base
/// label stays a substring, which is what makes the existence check catch
/// jobs submitted by earlier passes.
const LABEL_TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M:%S";

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Template file name looked up on each project.
    pub template_filename: String,
    /// Sessions created within this many days are evaluated.
    pub lookback_days: i64,
    /// Evaluate and resolve everything, submit nothing.
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_filename: crate::core::template::DEFAULT_TEMPLATE_FILENAME.to_string(),
            lookback_days: 7,
            dry_run: false,
        }
    }
}

/// Rule-driven job dispatcher over an injected platform client
pub struct WorkflowEngine<C>
where
    C: PlatformClient + Send + Sync + 'static,
{
    client: C,
    config: EngineConfig,
}

impl<C> WorkflowEngine<C>
where
    C: PlatformClient + Send + Sync + 'static,
{
    /// Create a new engine with an injected platform client
    pub fn new(client: C, config: EngineConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate every session created inside the lookback window.
    ///
    /// Per-session errors are logged and counted; the batch always runs to
    /// the end of the session list.
    pub async fn run(&self) -> WorkflowResult<RunSummary> {
        let cutoff = (Utc::now() - chrono::Duration::days(self.config.lookback_days)).date_naive();
        let sessions = self.client.find_sessions_created_after(cutoff).await?;
        info!(
            "🔎 Found {} sessions created after {}",
            sessions.len(),
            cutoff
        );

        let mut summary = RunSummary::default();
        for session in &sessions {
            match self.run_session(&session.id).await {
                Ok(Some(outcome)) => summary.record_outcome(outcome),
                Ok(None) => summary.record_session_skipped(),
                Err(e) => {
                    warn!("Session {} failed: {}", session.id, e);
                    summary.record_session_failure();
                }
            }
        }
        Ok(summary)
    }

    /// Evaluate a single session by id.
    ///
    /// Returns `None` when the id is not a session container or the project
    /// carries no template; both are quiet skips, not errors.
    pub async fn run_session(
        &self,
        session_id: &ContainerId,
    ) -> WorkflowResult<Option<SessionOutcome>> {
        let kind = self.client.container_type(session_id).await?;
        if kind != ContainerType::Session {
            info!(
                "Container {} is a {}... not a session. Skipping",
                session_id, kind
            );
            return Ok(None);
        }

        let session = self.client.get_session(session_id).await?;
        let project_id = session
            .parents
            .get("project")
            .ok_or_else(|| WorkflowError::UnknownParent {
                name: "project".to_string(),
            })?;
        let project = self.client.get_project(project_id).await?;
        let ctx = RunContext::new(
            &project.label,
            &session.subject_label,
            &session.label,
            session.id.as_str(),
        );

        let Some(template) = self.load_template(&project, &ctx).await? else {
            return Ok(None);
        };

        session_info!(ctx, "checking workflow ({} rules)", template.rules.len());

        let mut outcome = SessionOutcome::default();
        for rule in &template.rules {
            // Re-fetch so submissions and state changes from earlier rules
            // in this pass are visible.
            let session = self.client.get_session(session_id).await?;
            self.evaluate_rule(&session, rule, &ctx, &mut outcome).await?;
        }
        Ok(Some(outcome))
    }

    /// Best-effort poll until every job reaches a terminal state.
    ///
    /// Samples each job at `period` until `timeout` elapses. Returns whether
    /// all jobs finished; poll failures are logged, never raised.
    pub async fn wait_for_jobs(
        &self,
        job_ids: &[JobId],
        timeout: Duration,
        period: Duration,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut pending: Vec<JobId> = job_ids.to_vec();

        loop {
            let mut still_pending = Vec::new();
            for job_id in pending {
                match self.client.get_job_state(&job_id).await {
                    Ok(state) if state.is_terminal() => {
                        info!("Job {}: completed with status: {}", job_id, state);
                    }
                    Ok(_) => still_pending.push(job_id),
                    Err(e) => {
                        warn!("Job {}: state poll failed: {}", job_id, e);
                        still_pending.push(job_id);
                    }
                }
            }
            if still_pending.is_empty() {
                return true;
            }
            if tokio::time::Instant::now() + period > deadline {
                warn!(
                    "{} jobs not finished after {:?}... continuing",
                    still_pending.len(),
                    timeout
                );
                return false;
            }
            pending = still_pending;
            tokio::time::sleep(period).await;
        }
    }

    async fn load_template(
        &self,
        project: &ProjectRecord,
        ctx: &RunContext,
    ) -> WorkflowResult<Option<RuleTemplate>> {
        let files = self.client.list_files(&project.id).await?;
        if !files
            .iter()
            .any(|f| f.name == self.config.template_filename)
        {
            session_info!(
                ctx,
                "{} not found within project: {}. Skipping...",
                self.config.template_filename,
                project.label
            );
            return Ok(None);
        }

        let bytes = self
            .client
            .read_file(&project.id, &self.config.template_filename)
            .await?;
        RuleTemplate::from_slice(&bytes).map(Some)
    }

    async fn evaluate_rule(
        &self,
        session: &SessionRecord,
        rule: &Rule,
        ctx: &RunContext,
        outcome: &mut SessionOutcome,
    ) -> WorkflowResult<()> {
        outcome.record_rule();
        let label = rule.base_label();

        // Session-level plus acquisition-level analyses; the acquisition
        // scan covers gears that run at acquisition scope.
        let mut analyses = self.client.session_analyses(&session.id).await?;
        analyses.extend(self.client.acquisition_analyses(&session.id).await?);

        // 1. existing analysis?
        let query = ExistenceQuery {
            spec: rule.gear_spec(),
            statuses: BLOCKING_STATUSES,
            mode: MatchMode::Any,
            allowed_failures: rule.count_failures,
            label: Some(label),
        };
        if analysis_exists(&analyses, &query)? {
            session_info!(ctx, "EXISTING analysis found: Skipping... {}", label);
            outcome.record_skip(label, SkipReason::AlreadyRan);
            return Ok(());
        }

        // 2. prerequisites
        for prereq in &rule.prerequisites {
            let query = ExistenceQuery {
                spec: GearSpec::parse(&prereq.gear),
                statuses: COMPLETE_ONLY,
                mode: prereq.mode,
                allowed_failures: 1,
                label: prereq.analysis_label.as_deref(),
            };
            if !analysis_exists(&analyses, &query)? {
                session_info!(
                    ctx,
                    "PREREQUISITES not met: Skipping... {} (waiting on {})",
                    label,
                    prereq.gear
                );
                outcome.record_skip(label, SkipReason::PrerequisiteUnmet(prereq.gear.clone()));
                return Ok(());
            }
        }

        // 3. gates
        if let Err(denial) = evaluate_gates(
            session,
            rule.completeness_tags.as_deref(),
            &rule.session_tags,
        ) {
            session_info!(ctx, "{} ... Skipping... {}", denial, label);
            outcome.record_skip(label, SkipReason::GateDenied(denial.to_string()));
            return Ok(());
        }

        // 4. inputs
        let inputs = match self.resolve_inputs(session, rule, ctx).await {
            Ok(inputs) => inputs,
            Err(e) if e.is_rule_level() => {
                session_error!(ctx, "{} ... Skipping... {}", e, label);
                outcome.record_skip(label, SkipReason::InputUnresolved(e.to_string()));
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        // 5. dispatch
        let gear = match self
            .client
            .lookup_gear(&rule.gear_name, rule.gear_version.as_deref())
            .await
        {
            Ok(gear) => gear,
            Err(e) => {
                session_error!(ctx, "gear {} unavailable: {}", rule.gear_name, e);
                outcome.record_skip(label, SkipReason::GearUnavailable(rule.gear_name.clone()));
                return Ok(());
            }
        };

        let stamped_label = format!("{} {}", label, Local::now().format(LABEL_TIMESTAMP_FORMAT));

        if self.config.dry_run {
            session_info!(ctx, "DRY RUN: would submit {}", stamped_label);
            outcome.record_skip(label, SkipReason::DryRun);
            return Ok(());
        }

        let request = JobRequest {
            gear_id: gear.id.clone(),
            analysis_label: stamped_label.clone(),
            config: rule.config.clone(),
            inputs,
            tags: rule.tags.clone(),
            destination: session.id.clone(),
        };
        match self.client.submit_job(&request).await {
            Ok(job_id) => {
                session_info!(ctx, "RUNNING gear: {} (job {})", stamped_label, job_id);
                outcome.record_submission(job_id);
            }
            Err(e) => {
                session_error!(ctx, "submission failed for {}: {}", rule.gear_name, e);
                outcome.record_skip(label, SkipReason::SubmissionFailed(e.to_string()));
            }
        }

        if rule.sleep_seconds > 0 {
            tokio::time::sleep(Duration::from_secs(rule.sleep_seconds)).await;
        }
        Ok(())
    }

    async fn resolve_inputs(
        &self,
        session: &SessionRecord,
        rule: &Rule,
        ctx: &RunContext,
    ) -> WorkflowResult<HashMap<String, FileRef>> {
        let mut resolved = HashMap::new();
        for (slot_name, slot) in &rule.inputs {
            let Some(container) = self.input_container(session, slot, slot_name).await? else {
                if slot.optional {
                    continue;
                }
                return Err(WorkflowError::MissingRequiredInput {
                    slot: slot_name.clone(),
                });
            };

            let files = self.client.list_files(&container).await?;
            match match_slot(slot_name, slot, &container, &files)? {
                SlotMatch::Resolved(file) => {
                    session_debug!(ctx, "input '{}' -> {}", slot_name, file.name);
                    resolved.insert(slot_name.clone(), file);
                }
                SlotMatch::Skipped => {}
            }
        }
        Ok(resolved)
    }

    /// Container an input slot draws from: a parent of the session, or the
    /// outputs of a previously completed analysis.
    async fn input_container(
        &self,
        session: &SessionRecord,
        slot: &crate::core::InputSlot,
        slot_name: &str,
    ) -> WorkflowResult<Option<ContainerId>> {
        if let Some(parent) = &slot.parent_container {
            return session
                .parents
                .get(parent)
                .cloned()
                .map(Some)
                .ok_or_else(|| WorkflowError::UnknownParent {
                    name: parent.clone(),
                });
        }
        if let Some(spec) = &slot.find_analysis {
            let analyses = self.client.session_analyses(&session.id).await?;
            let found = find_analysis(&analyses, &GearSpec::parse(spec), COMPLETE_ONLY)?;
            return Ok(found.map(|a| a.id.clone()));
        }
        Err(WorkflowError::Template {
            message: format!("input '{slot_name}' names no source container"),
        })
    }
}
