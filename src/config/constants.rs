//! Application-wide constants
//!
//! Centralized location for magic values to improve maintainability.

// =============================================================================
// Application
// =============================================================================

/// Default display name
pub const DEFAULT_APP_NAME: &str = "HDM Boot";

/// Crate version reported by status endpoints
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Pagination
// =============================================================================

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Maximum allowed items per page to prevent excessive queries
pub const MAX_PAGE_SIZE: u64 = 100;

/// Default starting page number (1-indexed)
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

// =============================================================================
// Authentication & Security
// =============================================================================

/// Default JWT lifetime in seconds
pub const DEFAULT_JWT_EXPIRY_SECONDS: i64 = 3600;

/// Default `iss` claim
pub const DEFAULT_JWT_ISSUER: &str = "hdm-boot";

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Secret used outside production when JWT_SECRET is unset
pub const DEV_JWT_SECRET: &str = "hdm-boot-development-secret-change-me!";

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// JWT token type identifier
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Random bytes in a CSRF token (before base64 encoding)
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Random bytes in a session id
pub const SESSION_ID_BYTES: usize = 32;

/// Header carrying the CSRF token for API clients
pub const CSRF_HEADER: &str = "X-CSRF-Token";

// =============================================================================
// Sessions
// =============================================================================

/// Default session lifetime in seconds (2 hours)
pub const DEFAULT_SESSION_LIFETIME_SECONDS: i64 = 7200;

/// Default session cookie name
pub const DEFAULT_SESSION_COOKIE: &str = "hdm_session";

// =============================================================================
// Login throttling
// =============================================================================

/// Failed logins allowed per email inside the window
pub const DEFAULT_LOGIN_MAX_ATTEMPTS: u64 = 5;

/// Failed logins allowed per IP address inside the window
pub const DEFAULT_LOGIN_MAX_IP_ATTEMPTS: u64 = 20;

/// Throttle window in minutes
pub const DEFAULT_LOGIN_LOCKOUT_MINUTES: i64 = 15;

/// Login attempts older than this are pruned by maintenance
pub const LOGIN_ATTEMPT_RETENTION_HOURS: i64 = 24;

// =============================================================================
// User Roles & Statuses
// =============================================================================

/// Default role assigned to new users
pub const ROLE_USER: &str = "user";

/// Content editor role
pub const ROLE_EDITOR: &str = "editor";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "admin";

/// All valid role values
pub const VALID_ROLES: &[&str] = &[ROLE_USER, ROLE_EDITOR, ROLE_ADMIN];

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";
pub const STATUS_SUSPENDED: &str = "suspended";

/// All valid status values
pub const VALID_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_INACTIVE, STATUS_SUSPENDED];

// =============================================================================
// Server Configuration
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// Database & Filesystem
// =============================================================================

/// Default database connection URL (file-based SQLite, created on demand)
pub const DEFAULT_DATABASE_URL: &str = "sqlite://var/storage/app.db?mode=rwc";

pub const DEFAULT_STORAGE_PATH: &str = "var";
pub const DEFAULT_LOG_PATH: &str = "var/logs";
pub const DEFAULT_CONTENT_PATH: &str = "content/articles";
pub const DEFAULT_DOCS_PATH: &str = "docs";
pub const DEFAULT_TRANSLATIONS_PATH: &str = "resources/translations";
pub const DEFAULT_THEMES_PATH: &str = "resources/themes";

/// Metrics are appended to this file inside the log directory
pub const METRICS_LOG_FILE: &str = "metrics.log";

// =============================================================================
// Localization & Theming
// =============================================================================

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_SUPPORTED_LOCALES: &[&str] = &["en", "sk", "cs"];

/// Cookie remembering the chosen locale
pub const LOCALE_COOKIE: &str = "locale";

pub const DEFAULT_THEME: &str = "default";

// =============================================================================
// Monitoring
// =============================================================================

/// Requests slower than this are logged as warnings
pub const DEFAULT_SLOW_REQUEST_MS: u64 = 1000;

/// Database ping slower than this reports degraded
pub const DATABASE_DEGRADED_THRESHOLD_MS: u128 = 1000;

// =============================================================================
// Error handling
// =============================================================================

/// Base URI for Problem Details `type` members
pub const PROBLEM_TYPE_BASE: &str = "https://hdm-boot.dev/problems/";

/// Largest error body the problem middleware will buffer
pub const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Name length bounds (after trimming)
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 100;

// =============================================================================
// Blog
// =============================================================================

/// Reading speed used for reading-time estimates
pub const WORDS_PER_MINUTE: usize = 200;

/// Articles per blog page
pub const BLOG_PAGE_SIZE: u64 = 10;
