use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payment_router::application::dispatcher::{Dispatcher, RetryPolicy, WorkerPool};
use payment_router::application::health_monitor::HealthMonitor;
use payment_router::application::ingest::PaymentService;
use payment_router::application::summary::SummaryAggregator;
use payment_router::config::RouterConfig;
use payment_router::domain::payment::Processor;
use payment_router::domain::ports::{LedgerRef, WorkQueueRef};
use payment_router::domain::route::RouteState;
use payment_router::infrastructure::http_upstream::HttpProcessor;
use payment_router::infrastructure::in_memory::{ChannelQueue, InMemoryLedger};
use payment_router::interfaces::http::{self, AppState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn open_ledger(config: &RouterConfig) -> Result<LedgerRef> {
    if let Some(db_path) = &config.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            use payment_router::infrastructure::rocksdb::RocksDbLedger;
            let ledger = RocksDbLedger::open(db_path).into_diagnostic()?;
            info!(path = %db_path.display(), "using RocksDB ledger");
            return Ok(Arc::new(ledger));
        }

        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = db_path;
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }

    Ok(Arc::new(InMemoryLedger::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RouterConfig::parse();
    config.validate().into_diagnostic()?;

    let ledger = open_ledger(&config)?;
    let queue: WorkQueueRef =
        Arc::new(ChannelQueue::new(config.queue_capacity, config.workers).into_diagnostic()?);
    let route = Arc::new(RouteState::default());

    let client = reqwest::Client::new();
    let default = Arc::new(
        HttpProcessor::new(Processor::Default, &config.default_url, client.clone())
            .with_request_timeout(config.request_timeout())
            .with_health_timeout(config.health_timeout()),
    );
    let fallback = Arc::new(
        HttpProcessor::new(Processor::Fallback, &config.fallback_url, client)
            .with_request_timeout(config.request_timeout())
            .with_health_timeout(config.health_timeout()),
    );

    let monitor = HealthMonitor::new(default.clone(), fallback.clone(), route.clone())
        .with_interval(config.health_interval())
        .with_latency_threshold(config.latency_threshold())
        .spawn();

    let retry = match config.max_attempts {
        Some(max) => RetryPolicy::with_max_attempts(max),
        None => RetryPolicy::unbounded(),
    };
    let dispatcher = Dispatcher::new(default, fallback, route.clone(), queue.clone(), ledger.clone())
        .with_retry_policy(retry);
    let mut workers = WorkerPool::new(dispatcher, config.workers).spawn();

    let state = AppState {
        payments: PaymentService::new(queue),
        summary: SummaryAggregator::new(ledger),
        route,
    };

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .into_diagnostic()?;
    info!(addr = %config.bind, "payment router listening");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    };
    http::serve(listener, state, shutdown).await.into_diagnostic()?;

    monitor.abort();
    workers.abort_all();
    while workers.join_next().await.is_some() {}
    info!("payment router stopped");

    Ok(())
}
