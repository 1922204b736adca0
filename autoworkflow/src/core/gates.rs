//! Declarative gate checks: session tags and completeness flags
//!
//! Gates are evaluated after existence and prerequisite checks. They fail
//! closed: an absent completeness map, a missing key or a non-boolean value
//! all deny execution rather than erroring out.

use std::fmt;

use shared::SessionRecord;

/// Why a gate denied execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDenial {
    MissingSessionTag(String),
    /// Session carries no completeness map at all.
    CompletenessUnavailable,
    CompletenessNotSet(String),
}

impl fmt::Display for GateDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateDenial::MissingSessionTag(tag) => {
                write!(f, "Missing required session tag: {tag}")
            }
            GateDenial::CompletenessUnavailable => {
                write!(f, "Completeness conditions not accessible")
            }
            GateDenial::CompletenessNotSet(tag) => {
                write!(f, "Completeness condition not satisfied: {tag}")
            }
        }
    }
}

/// Check every declared gate against the session; the first denial wins.
///
/// `completeness_tags` distinguishes "key absent" (no completeness
/// constraint) from "key present with an empty list" (the session must at
/// least carry a completeness map).
pub fn evaluate_gates(
    session: &SessionRecord,
    completeness_tags: Option<&[String]>,
    session_tags: &[String],
) -> Result<(), GateDenial> {
    for tag in session_tags {
        if !session.has_tag(tag) {
            return Err(GateDenial::MissingSessionTag(tag.clone()));
        }
    }

    if let Some(tags) = completeness_tags {
        if !session.has_completeness_map() {
            return Err(GateDenial::CompletenessUnavailable);
        }
        for tag in tags {
            if !session.completeness_flag(tag).unwrap_or(false) {
                return Err(GateDenial::CompletenessNotSet(tag.clone()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::ContainerId;
    use std::collections::HashMap;

    fn session(tags: &[&str], completeness: Option<serde_json::Value>) -> SessionRecord {
        let mut info = HashMap::new();
        if let Some(map) = completeness {
            info.insert(SessionRecord::COMPLETENESS_KEY.to_string(), map);
        }
        SessionRecord {
            id: ContainerId::from("ses-1"),
            label: "baseline".to_string(),
            subject_label: "sub-01".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            parents: HashMap::new(),
            info,
            created: chrono::Utc::now(),
        }
    }

    fn strings(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn no_gates_always_pass() {
        let session = session(&[], None);
        assert_eq!(evaluate_gates(&session, None, &[]), Ok(()));
    }

    #[test]
    fn missing_session_tag_denies() {
        let session = session(&["ready"], None);
        let result = evaluate_gates(&session, None, &strings(&["ready", "qc-passed"]));
        assert_eq!(
            result,
            Err(GateDenial::MissingSessionTag("qc-passed".to_string()))
        );
    }

    #[test]
    fn completeness_satisfied_passes() {
        let session = session(&[], Some(json!({"Anatomy Acquired": true})));
        let tags = strings(&["Anatomy Acquired"]);
        assert_eq!(evaluate_gates(&session, Some(&tags), &[]), Ok(()));
    }

    #[test]
    fn false_completeness_flag_denies() {
        let session = session(&[], Some(json!({"Anatomy Acquired": false})));
        let tags = strings(&["Anatomy Acquired"]);
        assert_eq!(
            evaluate_gates(&session, Some(&tags), &[]),
            Err(GateDenial::CompletenessNotSet("Anatomy Acquired".to_string()))
        );
    }

    #[test]
    fn missing_completeness_key_denies() {
        let session = session(&[], Some(json!({})));
        let tags = strings(&["Anatomy Acquired"]);
        assert_eq!(
            evaluate_gates(&session, Some(&tags), &[]),
            Err(GateDenial::CompletenessNotSet("Anatomy Acquired".to_string()))
        );
    }

    #[test]
    fn absent_map_denies_even_with_empty_tag_list() {
        let session = session(&[], None);
        let result = evaluate_gates(&session, Some(&[]), &[]);
        assert_eq!(result, Err(GateDenial::CompletenessUnavailable));
    }

    #[test]
    fn session_tags_are_checked_before_completeness() {
        let session = session(&[], None);
        let result = evaluate_gates(&session, Some(&[]), &strings(&["ready"]));
        assert_eq!(result, Err(GateDenial::MissingSessionTag("ready".to_string())));
    }
}
