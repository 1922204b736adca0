//! Existence checks over a session's prior analyses
//!
//! The merged session + acquisition analysis list is scanned for analyses
//! that ran a given gear. The outcome decides both "already ran" skips and
//! prerequisite satisfaction, so the matching rules here are the heart of
//! the dispatcher's idempotence.

use regex::Regex;
use serde::Deserialize;

use shared::{AnalysisRecord, JobState};

use crate::error::{WorkflowError, WorkflowResult};

/// Statuses that block a re-run of the same rule. Cancelled is deliberately
/// absent: a cancelled analysis never stops a fresh submission.
pub const BLOCKING_STATUSES: &[JobState] = &[
    JobState::Complete,
    JobState::Running,
    JobState::Pending,
    JobState::Failed,
];

/// Status set for prerequisite satisfaction and `find-analysis` sources.
pub const COMPLETE_ONLY: &[JobState] = &[JobState::Complete];

/// How strictly matching analyses must sit inside the allowed status set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// One satisfying analysis is enough.
    #[default]
    Any,
    /// Every matching analysis must be inside the allowed statuses.
    All,
}

/// Gear identity filter: exact name plus optional version regex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearSpec {
    pub name: String,
    pub version_pattern: Option<String>,
}

impl GearSpec {
    pub fn new(name: impl Into<String>, version_pattern: Option<String>) -> Self {
        Self {
            name: name.into(),
            version_pattern,
        }
    }

    /// Parse the "name" or "name/version-regex" shorthand used by templates.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('/') {
            Some((name, version)) => Self::new(name, Some(version.to_string())),
            None => Self::new(spec, None),
        }
    }

    fn version_regex(&self) -> WorkflowResult<Option<Regex>> {
        self.version_pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|_| WorkflowError::InvalidRegex {
                    pattern: pattern.to_string(),
                })
            })
            .transpose()
    }

    fn matches(&self, analysis: &AnalysisRecord, version_re: Option<&Regex>) -> bool {
        let Some(gear) = &analysis.gear_info else {
            return false;
        };
        if gear.name != self.name {
            return false;
        }
        if let Some(re) = version_re {
            if !re.is_match(&gear.version) {
                return false;
            }
        }
        true
    }
}

/// One existence query against a session's analyses.
#[derive(Debug, Clone)]
pub struct ExistenceQuery<'a> {
    pub spec: GearSpec,
    pub statuses: &'a [JobState],
    pub mode: MatchMode,
    /// Failed analyses tolerated before the query counts as satisfied.
    pub allowed_failures: u32,
    /// Substring the analysis label must contain.
    pub label: Option<&'a str>,
}

/// Whether an analysis satisfying the query already exists.
///
/// In `Any` mode the scan accumulates: an analysis without a job state, or
/// with a non-failed state inside `statuses`, satisfies immediately; failed
/// ones count toward `allowed_failures` first. In `All` mode a single
/// matching analysis outside `statuses` defeats the query outright, no
/// matter what was (or will be) seen elsewhere in the list.
pub fn analysis_exists(
    analyses: &[AnalysisRecord],
    query: &ExistenceQuery<'_>,
) -> WorkflowResult<bool> {
    let version_re = query.spec.version_regex()?;
    let mut satisfied = false;
    let mut failures = 0u32;

    for analysis in analyses {
        if !query.spec.matches(analysis, version_re.as_ref()) {
            continue;
        }
        if let Some(label) = query.label {
            if !analysis.label.contains(label) {
                continue;
            }
        }

        match analysis.job_state {
            // No job attached: nothing to inspect, counts as satisfied.
            None => satisfied = true,
            Some(state) if query.statuses.contains(&state) => {
                if state == JobState::Failed {
                    failures += 1;
                    if failures >= query.allowed_failures {
                        satisfied = true;
                    }
                } else {
                    satisfied = true;
                }
            }
            Some(_) if query.mode == MatchMode::All => return Ok(false),
            Some(_) => {}
        }
    }

    Ok(satisfied)
}

/// Locate the analysis a `find-analysis` input source points at.
///
/// Session-level analyses only; the last match in list order wins. An
/// analysis without a job state matches regardless of `statuses`.
pub fn find_analysis<'a>(
    analyses: &'a [AnalysisRecord],
    spec: &GearSpec,
    statuses: &[JobState],
) -> WorkflowResult<Option<&'a AnalysisRecord>> {
    let version_re = spec.version_regex()?;
    let mut found = None;

    for analysis in analyses {
        if !spec.matches(analysis, version_re.as_ref()) {
            continue;
        }
        match analysis.job_state {
            None => found = Some(analysis),
            Some(state) if statuses.contains(&state) => found = Some(analysis),
            Some(_) => {}
        }
    }

    Ok(found)
}
