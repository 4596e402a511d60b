use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iotid_server::{config::Config, create_admin_router, create_enroll_router, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iotid_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let internal_address = config.internal_address;
    let enroll_address = config.enroll_address;
    tracing::info!(
        database = ?config.database_driver,
        auth = ?config.auth_provider,
        auto_registration = config.auto_registration_enabled,
        "Starting iotid server"
    );

    // Initialize application state
    let state = Arc::new(AppState::new(config).await?);

    let admin_listener = tokio::net::TcpListener::bind(&internal_address).await?;
    let enroll_listener = tokio::net::TcpListener::bind(&enroll_address).await?;
    tracing::info!("Admin API listening on {}", internal_address);
    tracing::info!("Enrollment API listening on {}", enroll_address);

    let admin = axum::serve(admin_listener, create_admin_router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal());
    let enroll = axum::serve(enroll_listener, create_enroll_router(state))
        .with_graceful_shutdown(shutdown_signal());

    tokio::try_join!(
        async { admin.await.map_err(anyhow::Error::from) },
        async { enroll.await.map_err(anyhow::Error::from) },
    )?;

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

    tracing::info!("Graceful shutdown initiated");
}
