//! Rule template model and loader
//!
//! A template is a JSON document stored as a file on the project container.
//! It lists, in evaluation order, the gears to run and the conditions under
//! which each one fires. Parsing is strict: unknown keys anywhere abort the
//! project's processing rather than silently skipping a misspelled condition.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

use crate::core::existence::{GearSpec, MatchMode};
use crate::error::{WorkflowError, WorkflowResult};

/// Default file name looked up on each project.
pub const DEFAULT_TEMPLATE_FILENAME: &str = "gears_template.json";

/// Top-level template document: an ordered list of rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTemplate {
    #[serde(rename = "analysis")]
    pub rules: Vec<Rule>,
}

impl RuleTemplate {
    /// Parse and validate a template from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> WorkflowResult<Self> {
        let template: RuleTemplate = serde_json::from_slice(bytes).map_err(|e| {
            WorkflowError::Template {
                message: e.to_string(),
            }
        })?;
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> WorkflowResult<()> {
        for rule in &self.rules {
            rule.validate()?;
        }
        Ok(())
    }
}

/// One dispatch rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    #[serde(rename = "gear-name")]
    pub gear_name: String,

    /// Matched as a regex against the versions of already-run analyses;
    /// used literally when looking the gear up for submission.
    #[serde(rename = "gear-version", default)]
    pub gear_version: Option<String>,

    /// Base analysis label; defaults to the gear name.
    #[serde(rename = "custom-label", default)]
    pub custom_label: Option<String>,

    #[serde(default)]
    pub inputs: HashMap<String, InputSlot>,

    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,

    /// Completeness flags that must be true. Declaring the key at all,
    /// even with an empty list, requires the session to carry a
    /// completeness map.
    #[serde(rename = "completeness-tags", default)]
    pub completeness_tags: Option<Vec<String>>,

    /// Tags the session itself must carry.
    #[serde(rename = "session-tags", default)]
    pub session_tags: Vec<String>,

    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Failed attempts tolerated before the rule counts as already run.
    #[serde(rename = "count-failures", default = "default_count_failures")]
    pub count_failures: u32,

    /// Pause after a submission, giving the platform time to register the
    /// new job before the next rule is evaluated.
    #[serde(default)]
    pub sleep_seconds: u64,
}

fn default_count_failures() -> u32 {
    1
}

impl Rule {
    /// Label new analyses are created under, and later recognized by.
    pub fn base_label(&self) -> &str {
        self.custom_label.as_deref().unwrap_or(&self.gear_name)
    }

    /// Gear identity filter for existence checks.
    pub fn gear_spec(&self) -> GearSpec {
        GearSpec::new(&self.gear_name, self.gear_version.clone())
    }

    fn validate(&self) -> WorkflowResult<()> {
        if self.gear_name.is_empty() {
            return Err(WorkflowError::Template {
                message: "rule with empty gear-name".to_string(),
            });
        }
        if self.count_failures < 1 {
            return Err(WorkflowError::Template {
                message: format!("rule '{}': count-failures must be at least 1", self.gear_name),
            });
        }
        if let Some(pattern) = &self.gear_version {
            compile_check(pattern)?;
        }
        for (slot_name, slot) in &self.inputs {
            slot.validate(slot_name)?;
        }
        for prereq in &self.prerequisites {
            if let Some(pattern) = &GearSpec::parse(&prereq.gear).version_pattern {
                compile_check(pattern)?;
            }
        }
        Ok(())
    }
}

fn compile_check(pattern: &str) -> WorkflowResult<()> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|_| WorkflowError::InvalidRegex {
            pattern: pattern.to_string(),
        })
}

/// Where one input slot's file comes from and how it is selected.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSlot {
    /// Key of `session.parents` naming the source container.
    #[serde(rename = "parent-container", default)]
    pub parent_container: Option<String>,

    /// "gear[/version-regex]" of a completed analysis whose output files
    /// are searched instead of a parent container.
    #[serde(rename = "find-analysis", default)]
    pub find_analysis: Option<String>,

    /// Exact file name.
    #[serde(default)]
    pub value: Option<String>,

    /// Regex over the container's file names; must match exactly one.
    #[serde(default)]
    pub regex: Option<String>,

    #[serde(default)]
    pub optional: bool,
}

impl InputSlot {
    fn validate(&self, slot_name: &str) -> WorkflowResult<()> {
        if self.value.is_some() == self.regex.is_some() {
            return Err(WorkflowError::Template {
                message: format!("input '{slot_name}' needs exactly one of 'value' or 'regex'"),
            });
        }
        if self.parent_container.is_some() == self.find_analysis.is_some() {
            return Err(WorkflowError::Template {
                message: format!(
                    "input '{slot_name}' needs exactly one of 'parent-container' or 'find-analysis'"
                ),
            });
        }
        if let Some(pattern) = &self.regex {
            compile_check(pattern)?;
        }
        if let Some(spec) = &self.find_analysis {
            if let Some(pattern) = &GearSpec::parse(spec).version_pattern {
                compile_check(pattern)?;
            }
        }
        Ok(())
    }
}

/// A gear that must have completed before the rule may fire.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Prerequisite {
    /// "gear[/version-regex]".
    #[serde(rename = "prereq-gear")]
    pub gear: String,

    /// Substring the satisfying analysis label must contain.
    #[serde(rename = "prereq-analysis-label", default)]
    pub analysis_label: Option<String>,

    /// How strictly matching analyses must be complete.
    #[serde(rename = "prereq-complete-analysis", default)]
    pub mode: MatchMode,
}
