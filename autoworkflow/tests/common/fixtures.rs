//! Test fixtures and data for workflow tests
//!
//! Consistent records and template documents used across the test suites.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use shared::{
    AnalysisRecord, ContainerId, FileEntry, GearInfo, GearRecord, JobState, ProjectRecord,
    SessionRecord,
};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const PROJECT_ID: &'static str = "proj-0001";
    pub const SESSION_ID: &'static str = "ses-0001";
    pub const TEMPLATE_NAME: &'static str = "gears_template.json";

    pub fn project() -> ProjectRecord {
        ProjectRecord {
            id: ContainerId::from(Self::PROJECT_ID),
            label: "neuro-study".to_string(),
        }
    }

    /// A session that passes the default gates: tagged "ready" and carrying
    /// a completeness map with one satisfied flag.
    pub fn session() -> SessionRecord {
        let mut parents = HashMap::new();
        parents.insert("project".to_string(), ContainerId::from(Self::PROJECT_ID));

        let mut info = HashMap::new();
        info.insert(
            SessionRecord::COMPLETENESS_KEY.to_string(),
            json!({"Anatomy Acquired": true}),
        );

        SessionRecord {
            id: ContainerId::from(Self::SESSION_ID),
            label: "baseline".to_string(),
            subject_label: "sub-01".to_string(),
            tags: vec!["ready".to_string()],
            parents,
            info,
            created: Utc::now(),
        }
    }

    pub fn gear(name: &str, version: &str) -> GearRecord {
        GearRecord {
            id: format!("gear-{name}"),
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    pub fn analysis(name: &str, version: &str, label: &str, state: JobState) -> AnalysisRecord {
        AnalysisRecord {
            id: ContainerId::new(format!("an-{name}-{label}")),
            label: label.to_string(),
            gear_info: Some(GearInfo {
                name: name.to_string(),
                version: version.to_string(),
            }),
            job_state: Some(state),
        }
    }

    pub fn file(name: &str) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            size: 2048,
        }
    }

    /// Minimal single-rule template: run "mriqc" on an exact project file.
    pub fn simple_template() -> serde_json::Value {
        json!({
            "analysis": [{
                "gear-name": "mriqc",
                "inputs": {
                    "t1": {"parent-container": "project", "value": "anatomy.nii.gz"}
                },
                "config": {"verbose": true},
                "tags": ["auto"]
            }]
        })
    }

    /// Two-rule template where the second rule requires the first.
    pub fn chained_template() -> serde_json::Value {
        json!({
            "analysis": [
                {
                    "gear-name": "dcm2niix",
                    "config": {},
                    "tags": []
                },
                {
                    "gear-name": "mriqc",
                    "prerequisites": [{"prereq-gear": "dcm2niix"}],
                    "config": {},
                    "tags": []
                }
            ]
        })
    }
}
