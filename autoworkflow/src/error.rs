//! Workflow-specific error types

use thiserror::Error;

use crate::traits::PlatformError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Ambiguous input '{slot}': {matches} files match")]
    AmbiguousInput { slot: String, matches: usize },

    #[error("Missing required input '{slot}'")]
    MissingRequiredInput { slot: String },

    #[error("Unknown parent container: {name}")]
    UnknownParent { name: String },

    #[error("Invalid regular expression: {pattern}")]
    InvalidRegex { pattern: String },

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl WorkflowError {
    /// Errors that skip the current rule but leave the session run alive.
    pub fn is_rule_level(&self) -> bool {
        matches!(
            self,
            WorkflowError::AmbiguousInput { .. }
                | WorkflowError::MissingRequiredInput { .. }
                | WorkflowError::UnknownParent { .. }
        )
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
