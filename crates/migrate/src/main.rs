//! Database bootstrap for the community message store.
//!
//! Usage: `community-migrate [up|down|status]` (defaults to `up`).

use anyhow::{Context, bail};
use community_common::{AppError, Config};
use tracing::info;

/// What to do with the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Up,
    Down,
    Status,
}

impl Command {
    fn parse(arg: Option<&str>) -> anyhow::Result<Self> {
        match arg {
            None | Some("up") => Ok(Self::Up),
            Some("down") => Ok(Self::Down),
            Some("status") => Ok(Self::Status),
            Some(other) => bail!("unknown command `{other}`, expected one of: up, down, status"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let arg = std::env::args().nth(1);
    let command = Command::parse(arg.as_deref())?;

    let config = Config::load().context("failed to load configuration")?;
    config.validate()?;
    community_common::logging::init(&config.logging)?;

    info!(?command, "Starting community-migrate");

    let db = community_db::init(&config).await.inspect_err(AppError::log)?;
    info!("Connected to database");

    match command {
        Command::Up => {
            community_db::migrate(&db).await.inspect_err(AppError::log)?;
            info!("Migrations completed");
        }
        Command::Down => {
            community_db::rollback(&db).await.inspect_err(AppError::log)?;
            info!("Rolled back last migration");
        }
        Command::Status => {
            let pending = community_db::pending_migrations(&db)
                .await
                .inspect_err(AppError::log)?;
            if pending.is_empty() {
                info!("Schema is up to date");
            }
            for name in pending {
                info!(migration = %name, "Pending");
            }
        }
    }

    Ok(())
}
