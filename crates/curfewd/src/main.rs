//! curfewd - The curfew background service
//!
//! This is the main entry point for the curfewd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization and schedule seeding
//! - Scheduler service
//! - Desktop entry enumeration and the restriction state file
//! - Reconciliation loop

use anyhow::{Context, Result};
use clap::Parser;
use curfew_config::{Policy, load_config};
use curfew_core::{CoreEvent, SchedulerService, SchedulerSettings, spawn_reconciliation_loop};
use curfew_host_api::EnforcementAgent;
use curfew_host_linux::{DesktopEnumerator, StateFileAgent};
use curfew_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use curfew_util::default_config_path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// curfewd - Time-based application restriction service
#[derive(Parser, Debug)]
#[command(name = "curfewd")]
#[command(about = "Time-based application restriction service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/curfew/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set CURFEW_DATA_DIR env var)
    #[arg(short, long, env = "CURFEW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    scheduler: Arc<SchedulerService>,
    store: Arc<dyn Store>,
    reconcile_interval: Duration,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let policy = if args.config.exists() {
            load_config(&args.config)
                .with_context(|| format!("Failed to load config from {:?}", args.config))?
        } else {
            warn!(config_path = %args.config.display(), "No configuration file, using defaults");
            Policy::default()
        };

        info!(
            config_path = %args.config.display(),
            distractive = policy.distractive.len(),
            seeds = policy.apps.len(),
            "Configuration loaded"
        );

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| policy.service.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // Initialize store
        let db_path = data_dir.join("curfew.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;

        // Collaborators
        let enumerator = Arc::new(DesktopEnumerator::new(
            policy.service.application_dirs.clone(),
        ));
        let agent = Arc::new(
            StateFileAgent::new(&policy.service.state_file).with_context(|| {
                format!("Failed to prepare state file {:?}", policy.service.state_file)
            })?,
        );

        info!(
            state_file = %agent.path().display(),
            capabilities = ?agent.capabilities(),
            application_dirs = enumerator.dirs().len(),
            "Collaborators initialized"
        );

        let scheduler = SchedulerService::new(
            SchedulerSettings::from_policy(&policy),
            store.clone(),
            enumerator,
            agent,
        );

        let seeded = scheduler
            .seed(&policy.apps)
            .context("Failed to seed schedules from configuration")?;
        if seeded > 0 {
            info!(seeded, "Seeded schedules from configuration");
        }

        Ok(Self {
            scheduler: Arc::new(scheduler),
            store,
            reconcile_interval: policy.service.reconcile_interval,
        })
    }

    async fn run(self) -> Result<()> {
        let events = self.scheduler.subscribe();
        let event_logger = tokio::spawn(log_core_events(events));

        // Initial build so the agent learns the current state right away
        if let Err(e) = self.scheduler.force_refresh().await {
            warn!(error = %e, "Initial registry build failed");
        }

        let reconciler = spawn_reconciliation_loop(self.scheduler.clone(), self.reconcile_interval);

        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        info!(
            interval_secs = self.reconcile_interval.as_secs(),
            "Service running"
        );

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // SIGHUP - rebuild the registry (e.g. after installing apps
                // or granting permissions)
                _ = sighup.recv() => {
                    info!("Received SIGHUP, refreshing application registry");
                    match self.scheduler.force_refresh().await {
                        Ok(app_count) => info!(app_count, "Registry refreshed"),
                        Err(e) => warn!(error = %e, "Registry refresh failed"),
                    }
                }
            }
        }

        info!("Shutting down curfewd");
        reconciler.abort();
        event_logger.abort();

        if let Err(e) = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped))
        {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }
}

async fn log_core_events(mut events: broadcast::Receiver<CoreEvent>) {
    loop {
        match events.recv().await {
            Ok(CoreEvent::RestrictionChanged {
                package_id,
                restricted,
                schedules_enabled,
            }) => {
                info!(%package_id, restricted, schedules_enabled, "Restriction published");
            }
            Ok(CoreEvent::RegistryStale { reason }) => {
                warn!(%reason, "Serving stale application registry");
            }
            Ok(event) => debug!(?event, "Core event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event logger fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => {
                error!("Core event channel closed");
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        mock_time = curfew_util::is_mock_time_active(),
        "curfewd starting"
    );

    let service = Service::new(&args)?;
    service.run().await
}
