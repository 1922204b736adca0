//! Main entry point for the autoworkflow binary
//!
//! Wires the real service implementations into the engine: credentials from
//! the environment, the REST platform client, and either a batch run over
//! recently created sessions or a single-session evaluation.

use clap::Parser;
use tracing::info;

use autoworkflow::services::{EnvCredentialSource, RestPlatformClient};
use autoworkflow::{CredentialSource, EngineConfig, RunSummary, WorkflowEngine};
use shared::{logging, ContainerId};

/// Rule-driven gear dispatch over recently created sessions
#[derive(Parser)]
#[command(name = "autoworkflow")]
#[command(about = "Evaluates per-project rule templates and submits analysis gear jobs")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Evaluate sessions created within this many days
    #[arg(long, default_value = "7")]
    pub lookback: i64,

    /// Template file name looked up on each project
    #[arg(long, default_value = "gears_template.json")]
    pub template: String,

    /// Single-session mode: evaluate only this session id
    #[arg(long)]
    pub session: Option<String>,

    /// Resolve everything but submit nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    let mode = match &args.session {
        Some(id) => format!("single-session mode ({id})"),
        None => format!("batch mode ({} day lookback)", args.lookback),
    };
    logging::log_startup(&format!("autoworkflow in {mode}"));

    let credentials = EnvCredentialSource
        .get_credentials()
        .await
        .map_err(|e| anyhow::anyhow!(e.message))?;
    let client = RestPlatformClient::new(&credentials)?;

    let config = EngineConfig {
        template_filename: args.template.clone(),
        lookback_days: args.lookback,
        dry_run: args.dry_run,
    };
    let engine = WorkflowEngine::new(client, config);

    let summary = match &args.session {
        Some(id) => {
            let mut summary = RunSummary::default();
            match engine.run_session(&ContainerId::new(id.clone())).await? {
                Some(outcome) => summary.record_outcome(outcome),
                None => summary.record_session_skipped(),
            }
            summary
        }
        None => engine.run().await?,
    };

    info!("✅ Run complete: {summary}");
    logging::log_shutdown("run finished");
    Ok(())
}
