use std::sync::Arc;

use anyhow::Context;
use garage_core::clock::{Clock, SystemClock};
use garage_db::{DocumentStore, PgChangeOutbox, PgDocumentStore};
use garage_events::bus::DEFAULT_CAPACITY;
use garage_events::{
    ChangeBus, ChangeListener, FcmBackend, PushGateway, RecipientResolver, ReminderSweep,
    TriggerContext, TriggerDispatcher,
};
use garage_worker::{telemetry, WorkerConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;
    telemetry::init(config.log_format);
    tracing::info!(
        sweep_time = %config.sweep_time,
        sweep_on_start = config.sweep_on_start,
        fcm_endpoint = %config.fcm.endpoint,
        "Loaded worker configuration"
    );

    let pool = garage_db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    garage_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    garage_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let backend = FcmBackend::new(&config.fcm)
        .await
        .context("Failed to initialise FCM backend")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(pool.clone()));
    let gateway = PushGateway::new(Arc::new(backend), Arc::clone(&clock));
    let resolver = RecipientResolver::new(Arc::clone(&store), Arc::clone(&clock));

    let cancel = CancellationToken::new();
    let (change_bus, changes) = ChangeBus::channel(DEFAULT_CAPACITY);

    let dispatcher = TriggerDispatcher::new(TriggerContext::new(
        Arc::clone(&store),
        resolver,
        gateway.clone(),
    ))
    .with_outbox(Arc::new(PgChangeOutbox::new(pool.clone())));
    let dispatcher_handle = tokio::spawn(dispatcher.run(changes, cancel.clone()));

    let listener = ChangeListener::new(pool.clone(), change_bus);
    let listener_cancel = cancel.clone();
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run(listener_cancel.clone()).await {
            tracing::error!(error = %e, "Change listener failed");
            listener_cancel.cancel();
        }
    });

    let sweep = ReminderSweep::new(store, gateway, clock);
    let sweep_time = config.sweep_time;
    let sweep_on_start = config.sweep_on_start;
    let sweep_cancel = cancel.clone();
    let sweep_handle = tokio::spawn(async move {
        if sweep_on_start {
            sweep.run_logged().await;
        }
        sweep.run(sweep_time, sweep_cancel).await;
    });

    tracing::info!("Worker started (change listener, trigger dispatcher, reminder sweep)");

    tokio::select! {
        () = shutdown_signal() => {}
        () = cancel.cancelled() => {
            tracing::warn!("A background service stopped, shutting down");
        }
    }
    cancel.cancel();

    let timeout = config.shutdown_timeout;
    let _ = tokio::time::timeout(timeout, listener_handle).await;
    tracing::info!("Change listener stopped");
    let _ = tokio::time::timeout(timeout, sweep_handle).await;
    tracing::info!("Reminder sweep stopped");
    let _ = tokio::time::timeout(timeout, dispatcher_handle).await;
    tracing::info!("Trigger dispatcher drained");

    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
