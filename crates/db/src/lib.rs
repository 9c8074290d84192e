//! Database layer for quizzes-rs.
//!
//! Entities, migrations and repositories for companies, membership,
//! invitations and join requests, quizzes and their results.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use std::time::Duration;

use quizzes_common::AppError;
use quizzes_common::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Pool settings for the configured database.
#[must_use]
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(&config.url);

    // Never let the floor exceed the ceiling.
    let max = config.max_connections.max(1);
    opt.max_connections(max)
        .min_connections(config.min_connections.min(max))
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);

    opt
}

/// Open the connection pool.
pub async fn init(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    Database::connect(connect_options(config))
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Apply pending migrations. Returns how many were applied.
pub async fn migrate(db: &DatabaseConnection) -> Result<usize, AppError> {
    let pending = Migrator::get_pending_migrations(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .len();

    if pending > 0 {
        Migrator::up(db, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
    }

    info!(applied = pending, "Schema up to date");
    Ok(pending)
}
