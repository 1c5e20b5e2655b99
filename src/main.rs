use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use inventory_watcher::config::{AppConfig, InventoryConfig, LoggingConfig, MetricsConfig};
use inventory_watcher::core::{ErrorStateTracker, FileIdentifierStore, IdentifierStore, Poller};
use inventory_watcher::models::PollState;
use inventory_watcher::plugins::traits::Notifier;
use inventory_watcher::plugins::{NotifierManager, templates};
use inventory_watcher::scheduler::{InventoryScheduler, ShutdownSignal};
use inventory_watcher::source::HttpInventorySource;
use inventory_watcher::source::proxy::{load_proxy_file, parse_proxy_list, strategy_for};

#[derive(Parser, Debug)]
#[command(name = "inventory-watcher", version, about = "Polls an inventory search and notifies on new listings")]
struct Args {
    /// Extra configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single cycle, flush the identifier store and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let _log_guard = init_tracing(&config.logging)?;
    info!("Starting Inventory Watcher...");

    if let Err(e) = init_metrics(&config.metrics) {
        warn!("Metrics exporter not started: {:#}", e);
    }

    let notifier = Arc::new(
        NotifierManager::from_config(&config.notifications)
            .await
            .context("failed to set up notifiers")?,
    );

    let poller = match build_poller(&config, notifier.clone()).await {
        Ok(poller) => poller,
        Err(e) => {
            report_startup_failure(notifier.as_ref(), &e).await;
            std::process::exit(1);
        }
    };

    if args.once {
        run_once(poller).await;
        notifier.shutdown().await.ok();
        return Ok(());
    }

    let mut scheduler = match InventoryScheduler::new(
        poller,
        notifier.clone(),
        config.poller.interval(),
        config.poller.shutdown_timeout(),
    )
    .await
    {
        Ok(scheduler) => scheduler,
        Err(e) => {
            report_startup_failure(notifier.as_ref(), &e).await;
            std::process::exit(1);
        }
    };

    let mut shutdown_signal = ShutdownSignal::register().context("failed to install signal handlers")?;

    if let Err(e) = scheduler.start().await {
        report_startup_failure(notifier.as_ref(), &e).await;
        std::process::exit(1);
    }

    let signal = shutdown_signal.recv().await;
    info!("Received {}, shutting down...", signal);

    scheduler.shutdown().await;
    if let Err(e) = notifier.shutdown().await {
        error!("Failed to shut down notifiers: {}", e);
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive(
        format!("inventory_watcher={}", logging.level.to_ascii_lowercase()).parse()?,
    );

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "inventory-watcher.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

fn init_metrics(metrics: &MetricsConfig) -> Result<()> {
    if !metrics.enabled {
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], metrics.port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!("Prometheus metrics listening on {}", addr);
    Ok(())
}

async fn collect_proxies(inventory: &InventoryConfig) -> Vec<String> {
    let mut proxies = parse_proxy_list(inventory.proxies.iter().map(String::as_str));

    if let Some(file) = &inventory.proxy_file {
        match load_proxy_file(Path::new(file)).await {
            Ok(from_file) => proxies.extend(from_file),
            Err(e) => warn!("Ignoring proxy file: {}", e),
        }
    }

    proxies
}

async fn build_poller(config: &AppConfig, notifier: Arc<NotifierManager>) -> Result<Poller> {
    let proxies = collect_proxies(&config.inventory).await;
    let source = HttpInventorySource::new(config.inventory.clone(), strategy_for(proxies));

    let store = FileIdentifierStore::load_or_empty(&config.store.path).await;
    info!(
        "Identifier store {} holds {} ids",
        store.path().display(),
        store.len()
    );
    let active_hours = config.poller.active_hours()?;
    if let Some(window) = &active_hours {
        info!("Active hours: {}", window);
    }

    Ok(Poller::new(Box::new(source), Box::new(store), notifier)
        .with_active_hours(active_hours)
        .with_tracker(ErrorStateTracker::new(
            config.poller.error_notification_interval(),
        ))
        .with_recovery_notification(config.poller.notify_on_recovery))
}

async fn run_once(mut poller: Poller) {
    let (_, outcome) = poller
        .run_cycle(PollState::new(), chrono::Local::now())
        .await;
    info!("Single cycle finished: {:?}", outcome);

    if let Err(e) = poller.flush().await {
        error!("Failed to flush identifier store: {}", e);
    }
}

async fn report_startup_failure(notifier: &dyn Notifier, e: &anyhow::Error) {
    error!("Startup failed: {:#}", e);
    notifier
        .dispatch(templates::startup_failed(&e.to_string()))
        .await;
}
