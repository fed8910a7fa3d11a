//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod login_attempt;
pub mod revoked_token;
pub mod session;
pub mod user;
