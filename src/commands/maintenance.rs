//! Maintenance command - Prunes expired security records.

use std::sync::Arc;

use chrono::Utc;

use crate::cli::args::{MaintenanceAction, MaintenanceArgs};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::Database;
use crate::services::Services;

/// Execute the maintenance command
pub async fn execute(args: MaintenanceArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config.database_url).await?;
    let services = Services::build(Arc::new(config), &db, Utc::now())?;

    match args.action {
        MaintenanceAction::Cleanup => {
            let report = services.cleanup().await?;
            println!(
                "Removed {} sessions, {} revoked tokens, {} login attempts",
                report.sessions, report.revoked_tokens, report.login_attempts
            );
        }
    }

    Ok(())
}
