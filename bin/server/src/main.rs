#[tokio::main]
async fn main() {
    use chrono::Duration as ChronoDuration;
    use gatehouse_server::{
        auth::{
            AppState,
            db::{SessionRepository, TransactionRepository},
            provider::ProviderClient,
        },
        config::ServerConfig,
        cors_layer, router,
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    // Cleanup expired sessions and abandoned login transactions on startup
    let session_repo = SessionRepository::new(db_pool.clone());
    match session_repo.delete_expired().await {
        Ok(count) if count > 0 => {
            tracing::info!(
                deleted_sessions = count,
                "Cleaned up expired sessions on startup"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to cleanup expired sessions on startup");
        }
    }
    let txn_repo = TransactionRepository::new(db_pool.clone());
    if let Err(e) = txn_repo.delete_stale(ChronoDuration::minutes(10)).await {
        tracing::warn!(error = %e, "Failed to cleanup stale login transactions on startup");
    }

    // Spawn periodic cleanup task
    let cleanup_pool = db_pool.clone();
    let cleanup_interval_secs = config.session.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            let repo = SessionRepository::new(cleanup_pool.clone());
            match repo.delete_expired().await {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup expired sessions");
                }
            }
            let repo = TransactionRepository::new(cleanup_pool.clone());
            match repo.delete_stale(ChronoDuration::minutes(10)).await {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_transactions = count, "Periodic transaction cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup stale login transactions");
                }
            }
        }
    });

    // Initialize the identity-provider client
    let provider =
        ProviderClient::new(config.provider.clone()).expect("failed to initialize provider client");

    // Create application state
    let app_state = Arc::new(AppState::new(db_pool, provider, &config));

    let app = router(app_state).layer(cors_layer(&config.cors_origins()));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .expect("server error");
}
