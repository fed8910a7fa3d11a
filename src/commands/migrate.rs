//! Schema migrations for the SQLite store.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    // Migrations are applied explicitly here, never on connect
    let db = Database::connect_without_migrations(&config.database_url).await?;

    match args.action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            tracing::info!(database = %config.database_url, "Schema is up to date");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            tracing::info!("Rolled back the latest migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            let pending = status.iter().filter(|(_, applied)| !applied).count();
            for (name, applied) in &status {
                println!("{:<50} {}", name, if *applied { "applied" } else { "pending" });
            }
            println!("{} of {} migrations pending", pending, status.len());
        }
        MigrateAction::Fresh { force } => {
            if config.app_env.is_production() && !force {
                return Err(AppError::BadRequest(
                    "Refusing to drop a production database without --force".to_string(),
                ));
            }
            tracing::warn!(database = %config.database_url, "Dropping all tables");
            db.fresh_migrations().await?;
            tracing::info!("Schema rebuilt from scratch");
        }
    }

    Ok(())
}
