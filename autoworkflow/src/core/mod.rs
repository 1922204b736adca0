//! Core rule-evaluation logic
//!
//! Pure decision logic over in-memory records: template parsing, existence
//! checks, gate conditions, input matching and run accounting. Nothing in
//! here touches the platform, which keeps every rule-evaluation path
//! testable without I/O.

pub mod existence;
pub mod gates;
pub mod inputs;
pub mod state;
pub mod template;

pub use existence::{
    analysis_exists, find_analysis, ExistenceQuery, GearSpec, MatchMode, BLOCKING_STATUSES,
    COMPLETE_ONLY,
};
pub use gates::{evaluate_gates, GateDenial};
pub use inputs::{match_slot, SlotMatch};
pub use state::{RunSummary, SessionOutcome, SkipReason};
pub use template::{InputSlot, Prerequisite, Rule, RuleTemplate};
