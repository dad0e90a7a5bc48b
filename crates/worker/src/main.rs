use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight_core::artifacts::ArtifactStore;
use finsight_db::{JobStore, PgJobStore};
use finsight_engine::TextSummarizer;
use finsight_queue::{PgQueue, QueueTransport};
use finsight_worker::{RecoverySweep, WorkerConfig, WorkerContext, WorkerPool};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finsight_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        concurrency = config.concurrency,
        poll_ms = config.poll_interval.as_millis() as u64,
        "Loaded worker configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = finsight_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    finsight_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(pool.clone()));
    let transport: Arc<dyn QueueTransport> = Arc::new(PgQueue::new(pool));
    let artifacts = Arc::new(ArtifactStore::from_env());
    let engine = Arc::new(TextSummarizer::new());

    let ctx = WorkerContext {
        store,
        transport,
        engine,
        artifacts,
        engine_timeout: config.engine_timeout,
    };

    // --- Worker pool + recovery sweep ---
    let cancel = CancellationToken::new();

    let pool_handles = WorkerPool::new(ctx.clone(), config.clone()).spawn(cancel.clone());
    tracing::info!(workers = pool_handles.len(), "Worker pool started");

    let sweep = RecoverySweep::new(ctx, config);
    let sweep_handle = tokio::spawn(sweep.run(cancel.clone()));
    tracing::info!("Recovery sweep started");

    // --- Shutdown ---
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, draining workers");
    cancel.cancel();

    for handle in pool_handles {
        let _ = tokio::time::timeout(Duration::from_secs(30), handle).await;
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM so the pool drains cleanly under
/// both interactive use and a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C)");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}
