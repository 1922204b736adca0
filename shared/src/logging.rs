//! Shared logging utilities for consistent tracing output
//!
//! Every log line emitted while a session is being evaluated carries the same
//! context field (project/subject/session plus id) so a run over hundreds of
//! sessions stays greppable. The `session_*!` macros attach that context; the
//! init functions configure the subscriber once per process.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::info;

/// Identifies one session evaluation in log output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub project: String,
    pub subject: String,
    pub session: String,
    pub session_id: String,
}

impl RunContext {
    pub fn new(
        project: impl Into<String>,
        subject: impl Into<String>,
        session: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            subject: subject.into(),
            session: session.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} ({})",
            self.project, self.subject, self.session, self.session_id
        )
    }
}

/// Initialize the stdout tracing subscriber with an optional base level
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, EnvFilter};

    let base_level = log_level.unwrap_or("info");
    let level_filter =
        format!("autoworkflow={base_level},shared={base_level},reqwest=warn,hyper=warn");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level_filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for session-aware info logging
#[macro_export]
macro_rules! session_info {
    ($ctx:expr, $($arg:tt)*) => {
        tracing::info!(
            session = %$ctx,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for session-aware warning logging
#[macro_export]
macro_rules! session_warn {
    ($ctx:expr, $($arg:tt)*) => {
        tracing::warn!(
            session = %$ctx,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for session-aware error logging
#[macro_export]
macro_rules! session_error {
    ($ctx:expr, $($arg:tt)*) => {
        tracing::error!(
            session = %$ctx,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for session-aware debug logging
#[macro_export]
macro_rules! session_debug {
    ($ctx:expr, $($arg:tt)*) => {
        tracing::debug!(
            session = %$ctx,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(timestamp = format_timestamp(), "🚀 Starting {}", details);
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(reason: &str) {
    info!(timestamp = format_timestamp(), "🛑 Shutting down: {}", reason);
}
