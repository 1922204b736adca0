//! Run accounting: what was submitted, what was skipped, and why

use std::fmt;

use shared::JobId;

/// Why a rule did not dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A matching analysis already exists (or failed too often).
    AlreadyRan,
    /// A prerequisite gear has not completed.
    PrerequisiteUnmet(String),
    /// A tag or completeness gate denied execution.
    GateDenied(String),
    /// An input slot could not be resolved.
    InputUnresolved(String),
    /// The gear could not be looked up on the platform.
    GearUnavailable(String),
    /// The platform rejected the submission.
    SubmissionFailed(String),
    /// Dry-run mode: everything resolved, nothing submitted.
    DryRun,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyRan => write!(f, "existing analysis found"),
            SkipReason::PrerequisiteUnmet(gear) => write!(f, "prerequisite not met: {gear}"),
            SkipReason::GateDenied(reason) => write!(f, "gate denied: {reason}"),
            SkipReason::InputUnresolved(reason) => write!(f, "input unresolved: {reason}"),
            SkipReason::GearUnavailable(gear) => write!(f, "gear unavailable: {gear}"),
            SkipReason::SubmissionFailed(reason) => write!(f, "submission failed: {reason}"),
            SkipReason::DryRun => write!(f, "dry run"),
        }
    }
}

/// Outcome of evaluating a single session.
#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    pub rules_evaluated: usize,
    pub submitted: Vec<JobId>,
    /// (rule label, reason) for every rule that did not dispatch.
    pub skipped: Vec<(String, SkipReason)>,
}

impl SessionOutcome {
    pub fn record_rule(&mut self) {
        self.rules_evaluated += 1;
    }

    pub fn record_submission(&mut self, job_id: JobId) {
        self.submitted.push(job_id);
    }

    pub fn record_skip(&mut self, label: &str, reason: SkipReason) {
        self.skipped.push((label.to_string(), reason));
    }
}

/// Aggregate accounting for one batch run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sessions_checked: usize,
    /// Sessions without a template, or ids that were not sessions.
    pub sessions_skipped: usize,
    pub sessions_failed: usize,
    pub rules_evaluated: usize,
    pub rules_skipped: usize,
    pub jobs_submitted: Vec<JobId>,
}

impl RunSummary {
    pub fn record_outcome(&mut self, outcome: SessionOutcome) {
        self.sessions_checked += 1;
        self.rules_evaluated += outcome.rules_evaluated;
        self.rules_skipped += outcome.skipped.len();
        self.jobs_submitted.extend(outcome.submitted);
    }

    pub fn record_session_skipped(&mut self) {
        self.sessions_checked += 1;
        self.sessions_skipped += 1;
    }

    pub fn record_session_failure(&mut self) {
        self.sessions_checked += 1;
        self.sessions_failed += 1;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sessions checked ({} skipped, {} failed), {} rules evaluated, {} jobs submitted",
            self.sessions_checked,
            self.sessions_skipped,
            self.sessions_failed,
            self.rules_evaluated,
            self.jobs_submitted.len()
        )
    }
}
