use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info};

use shopfront::config::database::run_migrations;
use shopfront::logging::{init_tracing, shutdown_tracer};
use shopfront::metrics::{init_metrics, metrics_app};
use shopfront::modules::sessions::SessionStore;
use shopfront::router::init_router;
use shopfront::state::init_app_state;

/// How often expired session rows are purged.
const SESSION_REAP_INTERVAL: Duration = Duration::from_secs(15 * 60);

fn env_port(name: &str, default: u16) -> u16 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn spawn_metrics_server() {
    let Some(handle) = init_metrics() else {
        return;
    };
    let port = env_port("METRICS_PORT", 9091);

    tokio::spawn(async move {
        match TcpListener::bind(("0.0.0.0", port)).await {
            Ok(listener) => {
                info!(port = port, "Metrics server listening on /metrics");
                if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                    error!(error = %e, "Metrics server stopped");
                }
            }
            Err(e) => error!(port = port, error = %e, "Failed to bind metrics port"),
        }
    });
}

fn spawn_session_reaper(store: Arc<dyn SessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_REAP_INTERVAL);
        loop {
            interval.tick().await;
            match store.delete_expired().await {
                Ok(count) => debug!(sessions.deleted = count, "Session reaper ran"),
                Err(e) => error!(error = %e, "Session reaper failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();
    spawn_metrics_server();

    let state = init_app_state().await?;
    run_migrations(&state.db).await?;
    spawn_session_reaper(state.sessions.clone());

    let port = env_port("PORT", 3000);
    let app = init_router(state);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;

    info!(port = port, "Server running on http://localhost:{}", port);
    info!("Swagger UI available at http://localhost:{}/swagger-ui", port);
    info!("Scalar UI available at http://localhost:{}/scalar", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    shutdown_tracer().await;

    Ok(())
}
