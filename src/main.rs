use gisty::workers::{KeygenConfig, KeygenWorker, Reaper, ReaperConfig};
use gisty::{create_app, AppState, Config, Database};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gisty=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("environment: {}", config.env);

    let db = Database::new(&config.db_path)?;
    let state = AppState::new(config, db);

    if state.config.rate_limit_enabled {
        tracing::info!(
            "rate limiting enabled: {} requests/minute",
            state.config.rate_limit_per_minute
        );
    }

    // Background workers share one shutdown signal.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let keygen = KeygenWorker::new(
        state.db.clone(),
        KeygenConfig {
            min_keys: state.config.kgs_min_keys,
            batch_size: state.config.kgs_batch_size,
            check_interval: state.config.kgs_check_interval,
        },
    );
    let keygen_handle = tokio::spawn(keygen.run(shutdown_rx.clone()));

    let reaper = Reaper::new(
        state.db.clone(),
        state.cache.clone(),
        ReaperConfig {
            interval: state.config.cleanup_interval,
            batch_size: state.config.cleanup_batch_size,
        },
    );
    let reaper_handle = tokio::spawn(reaper.run(shutdown_rx));

    let db = state.db.clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("gisty listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Stop the workers and give them a bounded window to wind down.
    let _ = shutdown_tx.send(true);
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = keygen_handle.await;
        let _ = reaper_handle.await;
    })
    .await;
    if drained.is_err() {
        tracing::warn!("background workers did not stop within 5s");
    }

    if let Err(e) = db.flush() {
        tracing::error!("failed to flush database: {}", e);
    } else {
        tracing::info!("database flushed successfully");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down gracefully...");
}
