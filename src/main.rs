use std::net::SocketAddr;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockroom::infrastructure::AppState;
use stockroom::{config, db, seed, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockroom=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    // Initialize database
    let db = db::init_db(&config.database_url).await?;
    let state = AppState::new(db.clone(), &config).await?;

    if let Some(admin) = &config.admin
        && let Err(e) = seed::bootstrap_admin(&db, &state.audit, admin).await
    {
        tracing::error!("Failed to bootstrap admin {}: {}", admin.username, e);
    }

    if config.seed_demo {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&db).await {
            tracing::error!("Failed to seed data: {}", e);
        }
    }

    // Audit flusher runs until shutdown, then drains the buffer
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let flusher = state.audit.spawn_flusher(shutdown_rx);

    let app = server::build_router(state, &config.cors_allowed_origins);

    // Find available port
    let port = server::find_available_port(config.port).ok_or("Failed to find available port")?;
    if port != config.port {
        tracing::warn!(
            "Preferred port {} was not available, using port {} instead",
            config.port,
            port
        );
    }

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Stockroom server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = flusher.await {
        tracing::error!("Audit flusher task failed: {}", e);
    }
    tracing::info!("Server stopped");
    Ok(())
}
