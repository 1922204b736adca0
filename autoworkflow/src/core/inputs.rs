//! Input-slot matching over container file listings
//!
//! Resolves one declared input slot to a concrete file by exact name or by
//! regex. Ambiguity is never resolved by guessing: two or more regex matches
//! fail the slot outright.

use regex::Regex;

use shared::{ContainerId, FileEntry, FileRef};

use crate::core::template::InputSlot;
use crate::error::{WorkflowError, WorkflowResult};

/// Outcome of matching one slot against a container's file listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotMatch {
    /// Slot resolved to a concrete file.
    Resolved(FileRef),
    /// Optional slot with no matching file; omitted from the job.
    Skipped,
}

/// Match one input slot against the files visible in `container`.
pub fn match_slot(
    slot_name: &str,
    slot: &InputSlot,
    container: &ContainerId,
    files: &[FileEntry],
) -> WorkflowResult<SlotMatch> {
    if let Some(name) = &slot.value {
        return match files.iter().find(|f| &f.name == name) {
            Some(file) => Ok(SlotMatch::Resolved(FileRef {
                container: container.clone(),
                name: file.name.clone(),
            })),
            None if slot.optional => Ok(SlotMatch::Skipped),
            None => Err(WorkflowError::MissingRequiredInput {
                slot: slot_name.to_string(),
            }),
        };
    }

    if let Some(pattern) = &slot.regex {
        let re = Regex::new(pattern).map_err(|_| WorkflowError::InvalidRegex {
            pattern: pattern.clone(),
        })?;
        let matching: Vec<&FileEntry> = files.iter().filter(|f| re.is_match(&f.name)).collect();
        return match matching.len() {
            1 => Ok(SlotMatch::Resolved(FileRef {
                container: container.clone(),
                name: matching[0].name.clone(),
            })),
            0 if slot.optional => Ok(SlotMatch::Skipped),
            0 => Err(WorkflowError::MissingRequiredInput {
                slot: slot_name.to_string(),
            }),
            n => Err(WorkflowError::AmbiguousInput {
                slot: slot_name.to_string(),
                matches: n,
            }),
        };
    }

    // Template validation guarantees one selector; reaching here means the
    // slot bypassed it.
    Err(WorkflowError::Template {
        message: format!("input '{slot_name}' has no selector"),
    })
}
