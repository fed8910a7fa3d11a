//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// HDM Boot - modular monolith web backend
#[derive(Parser, Debug)]
#[command(name = "hdm-boot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Manage user accounts
    User(UserArgs),

    /// Housekeeping tasks
    Maintenance(MaintenanceArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to (defaults to SERVER_HOST)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on (defaults to SERVER_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Drop every table and re-run all migrations
    Fresh {
        /// Required when APP_ENV is production
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for the user command
#[derive(Parser, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub action: UserAction,
}

/// User management actions
#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Create an account, e.g. the first administrator
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// Read from HDM_USER_PASSWORD when omitted
        #[arg(long, env = "HDM_USER_PASSWORD", hide_env_values = true)]
        password: String,
        /// admin, editor or user
        #[arg(long, default_value = "user")]
        role: String,
    },
}

/// Arguments for the maintenance command
#[derive(Parser, Debug)]
pub struct MaintenanceArgs {
    #[command(subcommand)]
    pub action: MaintenanceAction,
}

/// Maintenance actions
#[derive(Subcommand, Debug)]
pub enum MaintenanceAction {
    /// Delete expired sessions, expired revoked tokens and old login attempts
    Cleanup,
}
