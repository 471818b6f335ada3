use anyhow::Result;
use dokira::{AppState, Config};

pub async fn serve(
    config: Config,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting dokira server...");

    // Use CLI overrides if provided, otherwise use config
    let host = host_override.unwrap_or(config.server.host.to_owned());
    let port = port_override.unwrap_or(config.server.port);

    let pool =
        dokira::create_pool(&config.database.url, config.database.max_connections).await?;

    dokira_db::migrate(&pool).await?;

    let state = AppState::new(config, pool.clone());
    let app = dokira::router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Closing database pool...");
    pool.close().await;
    tracing::info!("Graceful shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
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
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Starting graceful shutdown...");
}

pub async fn migrate(config: Config) -> Result<()> {
    tracing::info!("Running database migrations...");

    let pool = dokira::create_pool(&config.database.url, 1).await?;
    dokira_db::migrate(&pool).await?;
    pool.close().await;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}

pub async fn reset(config: Config) -> Result<()> {
    tracing::info!("Resetting database...");

    let pool = dokira::create_pool(&config.database.url, 1).await?;
    dokira_db::revert(&pool).await?;
    tracing::info!("Existing tables dropped");

    dokira_db::migrate(&pool).await?;
    pool.close().await;

    tracing::info!("Database reset completed successfully");

    Ok(())
}
