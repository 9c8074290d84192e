//! Quizzes server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use fred::clients::Client as RedisClient;
use fred::interfaces::ClientLike;
use fred::types::config::Config as RedisConfig;
use quizzes_common::{Config, EphemeralCacheService, RedisCache};
use quizzes_core::EventPublisherService;
use quizzes_queue::{RedisPubSub, SchedulerConfig, run_scheduler};
use quizzes_server::{AppState, Services, router};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine outside development
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizzes=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting quizzes server...");

    let config = Config::load()?;

    let db = Arc::new(quizzes_db::init(&config.database).await?);
    info!("Connected to database");

    let applied = quizzes_db::migrate(&db).await?;
    info!(applied, "Migrations completed");

    info!("Connecting to Redis...");
    let redis = RedisClient::new(RedisConfig::from_url(&config.redis.url)?, None, None, None);
    redis.init().await?;
    let redis = Arc::new(redis);
    info!("Connected to Redis");

    let publisher: EventPublisherService =
        Arc::new(RedisPubSub::new(redis.clone(), config.redis.prefix.clone()));
    let cache: EphemeralCacheService =
        Arc::new(RedisCache::new(redis.clone(), config.redis.prefix.clone()));

    let services = Services::build(db.clone(), &config.cache, publisher, cache);
    info!(
        result_ttl_secs = config.cache.result_ttl_secs,
        "Services initialized"
    );

    let scheduler = run_scheduler(
        SchedulerConfig::from(&config.scheduler),
        Arc::new(services.reminders.clone()),
    );
    info!(
        interval_secs = config.scheduler.reminder_interval_secs,
        "Reminder scheduler started"
    );

    let app = router(AppState { db });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.abort();
    if let Err(e) = redis.quit().await {
        warn!(error = %e, "Failed to close Redis connection cleanly");
    }

    info!("Server shutdown complete");
    Ok(())
}
