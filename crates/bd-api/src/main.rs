//! BreachDesk API server binary.

use anyhow::Context;
use bd_api::{run_server, ApiServerConfig, AppState};
use bd_connectors::HttpAnalysisWorker;
use bd_core::blob::FsObjectStore;
use bd_core::orchestrator::AnalysisOrchestrator;
use bd_core::store::{
    create_analysis_status_repository, create_incident_repository, create_pool, run_migrations,
};
use bd_core::taxonomy::TriggerStore;
use bd_core::{EvidenceConfig, EvidenceManager};
use bd_observability::{init_logging_with_config, LoggingConfig};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// BreachDesk API server.
#[derive(Debug, Parser)]
#[command(name = "bd-api", version, about)]
struct Cli {
    /// Address to bind the API server to.
    #[arg(long, env = "BD_BIND_ADDRESS", default_value = "0.0.0.0:8080")]
    bind_address: SocketAddr,

    /// SQLite database URL.
    #[arg(long, env = "BD_DATABASE_URL", default_value = "sqlite:breachdesk.db")]
    database_url: String,

    /// URL of the external analysis worker. Dispatch fails cleanly when
    /// unset.
    #[arg(long, env = "BD_ANALYSIS_WORKER_URL")]
    analysis_worker_url: Option<String>,

    /// Directory evidence blobs are stored under.
    #[arg(long, env = "BD_EVIDENCE_ROOT", default_value = "./evidence")]
    evidence_root: String,

    /// Base URL clients fetch evidence blobs from.
    #[arg(
        long,
        env = "BD_EVIDENCE_BASE_URL",
        default_value = "http://localhost:8080/files"
    )]
    evidence_base_url: String,

    /// Path to the taxonomy/trigger reference data JSON.
    #[arg(long, env = "BD_TRIGGER_STORE_PATH")]
    trigger_store_path: Option<String>,

    /// Emit logs as JSON.
    #[arg(long, env = "BD_JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging = if cli.json_logs {
        LoggingConfig::production()
    } else {
        LoggingConfig::default()
    };
    init_logging_with_config(logging);

    let pool = create_pool(&cli.database_url)
        .await
        .context("connecting to the database")?;
    run_migrations(&pool).await.context("running migrations")?;

    let statuses = create_analysis_status_repository(&pool);
    let incidents = create_incident_repository(&pool);

    if cli.analysis_worker_url.is_none() {
        warn!("no analysis worker URL configured; dispatch requests will fail until one is set");
    }
    let worker = Arc::new(
        HttpAnalysisWorker::new(cli.analysis_worker_url.clone())
            .map_err(|e| anyhow::anyhow!("building worker client: {e}"))?,
    );

    let orchestrator = Arc::new(AnalysisOrchestrator::new(statuses.clone(), worker));

    let blobs = Arc::new(FsObjectStore::new(
        &cli.evidence_root,
        cli.evidence_base_url.clone(),
    ));
    let evidence = Arc::new(EvidenceManager::new(
        blobs,
        incidents.clone(),
        EvidenceConfig::default(),
    ));

    let triggers = match &cli.trigger_store_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading trigger store from {path}"))?;
            let store = TriggerStore::from_json(&raw).context("parsing trigger store")?;
            info!(
                triggers = store.triggers.len(),
                taxonomy_items = store.taxonomy.len(),
                "trigger store loaded"
            );
            store
        }
        None => {
            warn!("no trigger store configured; obligation schedules will be empty");
            TriggerStore::default()
        }
    };

    let state = AppState {
        statuses,
        incidents,
        orchestrator,
        evidence,
        triggers: Arc::new(triggers),
    };

    let config = ApiServerConfig {
        bind_address: cli.bind_address,
    };
    run_server(config, state).await.context("running server")?;
    Ok(())
}
