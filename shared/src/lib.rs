//! Shared types for the workflow-automation system
//!
//! Contains the platform-facing data model (sessions, analyses, files, gears,
//! jobs) plus logging setup used by every binary. Engine-internal types (rule
//! templates, evaluation outcomes) live in the `autoworkflow` crate.

pub mod logging;
pub mod types;

pub use types::*;
