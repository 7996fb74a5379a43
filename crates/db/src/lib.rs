//! Database layer for community messages.

pub mod entities;
pub mod error;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use community_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Build pool options from configuration.
#[must_use]
pub fn connect_options(config: &Config) -> ConnectOptions {
    let db = &config.database;
    let mut opt = ConnectOptions::new(&db.url);

    opt.max_connections(db.max_connections)
        .min_connections(db.min_connections)
        .connect_timeout(Duration::from_secs(db.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(db.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(db.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(db.sql_logging)
        .sqlx_logging_level(LevelFilter::Debug);

    opt
}

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    Database::connect(connect_options(config))
        .await
        .map_err(error::classify)
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Roll back the most recent migration.
pub async fn rollback(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::down(db, Some(1))
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Names of migrations not yet applied.
pub async fn pending_migrations(db: &DatabaseConnection) -> Result<Vec<String>, AppError> {
    use sea_orm_migration::MigratorTrait;
    let pending = migrations::Migrator::get_pending_migrations(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(pending.iter().map(|m| m.name().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use community_common::config::{DatabaseConfig, LoggingConfig, PaginationConfig};

    #[test]
    fn test_connect_options_follow_config() {
        let config = Config {
            database: DatabaseConfig {
                url: "postgres://localhost/community".to_string(),
                max_connections: 12,
                min_connections: 2,
                connect_timeout_secs: 3,
                idle_timeout_secs: 60,
                sql_logging: false,
            },
            pagination: PaginationConfig::default(),
            logging: LoggingConfig::default(),
        };

        let opt = connect_options(&config);
        assert_eq!(opt.get_url(), "postgres://localhost/community");
        assert_eq!(opt.get_max_connections(), Some(12));
        assert_eq!(opt.get_min_connections(), Some(2));
        assert_eq!(opt.get_connect_timeout(), Some(Duration::from_secs(3)));
        assert!(!opt.get_sqlx_logging());
    }
}
