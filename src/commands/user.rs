//! User command - Account provisioning from the console.

use std::sync::Arc;

use crate::cli::args::{UserAction, UserArgs};
use crate::config::Config;
use crate::domain::{User, UserRole};
use crate::errors::AppResult;
use crate::infra::{Database, Persistence};
use crate::services::{AuditLogListener, EventDispatcher, NewUser, UserManager, UserService, ALL_EVENTS};

/// Execute the user command
pub async fn execute(args: UserArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config.database_url).await?;

    match args.action {
        UserAction::Create {
            email,
            name,
            password,
            role,
        } => {
            let input = NewUser {
                email,
                password,
                name,
                role: UserRole::parse(&role)?,
            };
            let user = create(&db, input).await?;
            println!("Created {} {} ({})", user.role, user.email, user.id);
        }
    }

    Ok(())
}

/// Create a user without an acting account; the same validation and
/// uniqueness rules as the API apply.
pub async fn create(db: &Database, input: NewUser) -> AppResult<User> {
    let users = UserManager::new(
        Arc::new(Persistence::new(db.get_connection())),
        Arc::new(console_events()),
    );
    users.create_user(None, input).await
}

/// Console accounts still reach the audit log
fn console_events() -> EventDispatcher {
    let events = EventDispatcher::new();
    events.subscribe(ALL_EVENTS, Arc::new(AuditLogListener));
    events
}
