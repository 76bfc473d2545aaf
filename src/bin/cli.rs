//! orgwatch CLI
//!
//! Wires the engine components together and renders emitted events.
//! All engine behavior lives in the library.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use orgwatch::{
    cache::Cache,
    error::Result,
    fetch::HttpFetcher,
    models::{Config, EngineEvent},
    poll::{IncidentPoller, StatusPoller},
    store::{LocalStore, Store},
    sync::{OrgRosterSync, apply_changes, reconcile},
};

/// orgwatch - organization roster sync and platform status monitor
#[derive(Parser, Debug)]
#[command(
    name = "orgwatch",
    version,
    about = "Organization roster sync and platform status monitor"
)]
struct Cli {
    /// Path to the data directory containing config and state files
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the status and incident pollers until interrupted
    Watch,

    /// Sync the organization roster and reconcile local ranks
    Sync {
        /// Organization short-code (default: from config)
        #[arg(long)]
        sid: Option<String>,
    },

    /// Check current platform status once
    Status,

    /// Show recent incidents from the store
    Incidents {
        /// Maximum entries to show
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Validate configuration files
    Validate,

    /// Show current store state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Render engine events as log lines.
fn spawn_event_printer(
    mut events: mpsc::Receiver<EngineEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::StatusChanged(snapshot) => {
                    for (system, status) in &snapshot.systems {
                        log::info!("status: {system} -> {}", status.as_str());
                    }
                }
                EngineEvent::NewIncident { record, urgent } => {
                    let marker = if urgent { " [URGENT]" } else { "" };
                    log::info!("incident{marker}: {} ({})", record.title, record.status);
                }
                EngineEvent::RosterSynced(members) => {
                    log::info!("roster synced: {} members", members.len());
                }
                EngineEvent::MemberReconciled(change) => {
                    log::info!(
                        "rank change: {} {} -> {} ({})",
                        change.handle,
                        change.old_rank,
                        change.new_rank,
                        change.reason.describe()
                    );
                }
            }
        }
    })
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.data_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    config.validate()?;

    let token = CancellationToken::new();
    let fetcher = HttpFetcher::new(&config.fetcher, token.clone())?;
    let cache = Cache::new(&config.cache);
    let store: Arc<dyn Store> =
        Arc::new(LocalStore::new(&cli.data_dir, config.poll.history_limit));
    let (events_tx, events_rx) = mpsc::channel(256);
    let printer = spawn_event_printer(events_rx);

    match cli.command {
        Command::Watch => {
            let status_poller = StatusPoller::new(
                fetcher.clone(),
                cache.clone(),
                Arc::clone(&store),
                &config,
                &config.cache,
                events_tx.clone(),
            )?;
            let incident_poller = IncidentPoller::new(
                fetcher.clone(),
                Arc::clone(&store),
                &config,
                events_tx.clone(),
            )?;

            let status_handle = tokio::spawn(status_poller.run(token.child_token()));
            let incident_handle = tokio::spawn(incident_poller.run(token.child_token()));

            log::info!("Watching; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            log::info!("Shutdown requested");
            token.cancel();

            let _ = status_handle.await;
            let _ = incident_handle.await;
        }

        Command::Sync { sid } => {
            let roster_sync = OrgRosterSync::new(
                fetcher.clone(),
                cache.clone(),
                config.endpoints.clone(),
                config.roster.clone(),
                &config.cache,
                events_tx.clone(),
            );

            let sid = sid.unwrap_or_else(|| config.roster.org_sid.clone());
            let roster = roster_sync.sync_org(&sid).await?;
            log::info!("Fetched {} roster members for {sid}", roster.len());

            let local = store.members().await?;
            let changes = reconcile(&roster, &local, &config.ranks, chrono::Utc::now());
            if changes.is_empty() {
                log::info!("All {} local members already consistent", local.len());
            } else {
                apply_changes(store.as_ref(), &events_tx, &changes).await?;
                log::info!("Applied {} rank changes", changes.len());
            }
        }

        Command::Status => {
            let status_poller = StatusPoller::new(
                fetcher.clone(),
                cache.clone(),
                Arc::clone(&store),
                &config,
                &config.cache,
                events_tx.clone(),
            )?;

            let snapshot = status_poller.current_status(chrono::Utc::now()).await?;
            for (system, status) in &snapshot.systems {
                log::info!("{system}: {}", status.as_str());
            }
        }

        Command::Incidents { limit } => {
            let incidents = store.recent_incidents(limit).await?;
            if incidents.is_empty() {
                log::info!("No incidents recorded.");
            }
            for incident in incidents {
                log::info!(
                    "[{}] {} ({})",
                    incident.timestamp.format("%Y-%m-%d %H:%M UTC"),
                    incident.title,
                    incident.status
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Data directory: {}", cli.data_dir.display());

            match store.load_status().await? {
                Some(snapshot) => {
                    log::info!("Last status check: {}", snapshot.checked_at.to_rfc3339())
                }
                None => log::info!("No status snapshot yet."),
            }

            let incidents = store.recent_incidents(usize::MAX).await?;
            log::info!("Stored incidents: {}", incidents.len());

            let members = store.members().await?;
            log::info!("Local members: {}", members.len());

            let history = store.role_history(usize::MAX).await?;
            log::info!("Rank changes on record: {}", history.len());
        }
    }

    drop(events_tx);
    let _ = printer.await;

    Ok(())
}
