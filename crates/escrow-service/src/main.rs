//! escrow-service — webhook intake + worker runtime for the escrow timing
//! engine.
//!
//! Reads config from env vars (see `escrow_service::config::Config`):
//!   REDIS_URL, HELIUS_WEBHOOK_SECRET — required
//!   ACTIONS_BASEURL, RPC_URL, WORKER_CONCURRENCY, LOG_LEVEL,
//!   AUTO_FINALIZE_RELEASE, AUTO_FINALIZE_REFUND, NOTIFY_DRIVER,
//!   NOTIFY_DIALECT_KEY, NOTIFY_DIALECT_BASEURL — optional

use std::sync::Arc;

use escrow_core::{Api, ChainPolicy, Notification, PolicyGate, SchedulingEngine};
use escrow_types::SchedulingPlan;
use tokio::net::TcpListener;

use escrow_service::adapters::{DialectNotifier, HttpApiClient, NoopNotifier};
use escrow_service::config::{Config, NotifyDriver};
use escrow_service::http::{router, AppState};
use escrow_service::queue::RedisQueue;
use escrow_service::worker::WorkerRuntime;
use escrow_service::{error::ServiceError, logging};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Best-effort: local dev loads `.env`, deployed containers set env
    // directly and there is nothing to read.
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|err| {
        eprintln!("fatal boot error: {err}");
        std::process::exit(1);
    });

    logging::init(&config.log_level);
    tracing::info!(
        concurrency = config.worker_concurrency,
        notify_driver = ?config.notify_driver,
        "escrow-service booting"
    );

    // Parses the URL only; the real connection is established lazily on
    // first use so a boot-time Redis outage never blocks the HTTP surface
    // from coming up.
    let queue = Arc::new(RedisQueue::new(&config.redis_url).map_err(|err| {
        tracing::error!(error = %err, "failed to parse queue substrate url");
        ServiceError::from(escrow_core::ProcessorError::Queue(err))
    })?);

    let api: Arc<dyn Api> = Arc::new(HttpApiClient::new(
        config
            .actions_baseurl
            .clone()
            .unwrap_or_else(|| "http://localhost:4000".to_string()),
    ));

    let notifier: Arc<dyn Notification> = match config.notify_driver {
        NotifyDriver::Noop => Arc::new(NoopNotifier),
        NotifyDriver::Dialect => Arc::new(DialectNotifier::new(
            config
                .notify_dialect_baseurl
                .clone()
                .expect("validated present for the dialect driver at config load time"),
            config.notify_dialect_key.clone(),
        )),
    };

    let policy: Arc<dyn ChainPolicy> = Arc::new(PolicyGate::new(
        config.auto_finalize_release,
        config.auto_finalize_refund,
    ));

    let engine = Arc::new(SchedulingEngine::new((*queue).clone()));

    let state = AppState {
        engine: Arc::clone(&engine),
        api: Arc::clone(&api),
        plan: SchedulingPlan::default(),
        webhook_secret: config.webhook_secret.clone(),
    };
    let app = router(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {bind_addr}: {e}"));
    tracing::info!(%bind_addr, "HTTP surface listening");

    let runtime = WorkerRuntime {
        queue: Arc::clone(&queue),
        api,
        notifier,
        policy,
        concurrency: config.worker_concurrency,
    };

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let http_shutdown_rx = shutdown_tx.subscribe();
    let http_handle = tokio::spawn(async move {
        let mut rx = http_shutdown_rx;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await
    });

    let worker_shutdown_rx = shutdown_tx.subscribe();
    let worker_handle = tokio::spawn(async move {
        let mut rx = worker_shutdown_rx;
        runtime
            .run(async move {
                let _ = rx.recv().await;
            })
            .await;
    });

    shutdown_signal().await;
    tracing::info!("shutdown signal received, closing HTTP surface and worker queues");
    let _ = shutdown_tx.send(());

    let _ = http_handle.await;
    let _ = worker_handle.await;

    tracing::info!("escrow-service shut down cleanly");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on unix, SIGTERM — whichever arrives first.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
