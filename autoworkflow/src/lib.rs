//! Workflow-automation library for rule-driven gear dispatch
//!
//! This library walks recently created sessions on a remote data platform,
//! evaluates each project's JSON rule template against the session's prior
//! analyses, tags and completeness flags, resolves declared input files, and
//! submits analysis gear jobs without ever duplicating an earlier run.
//!
//! The platform itself is reached through the injected [`PlatformClient`]
//! trait, keeping the rule-evaluation core free of transport concerns and
//! fully testable with mocks.

pub mod core;
pub mod engine;
pub mod error;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use core::{GearSpec, MatchMode, Rule, RuleTemplate, RunSummary, SessionOutcome, SkipReason};
pub use engine::{EngineConfig, WorkflowEngine};
pub use error::{WorkflowError, WorkflowResult};
pub use traits::{CredentialSource, Credentials, PlatformClient, PlatformError};
