//! Authentication service - credentials, tokens and registration.
//!
//! Login runs the same steps for the JSON API and the web form: throttle
//! check, constant-work password verification, attempt bookkeeping and
//! domain events.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::events::EventDispatcher;
use super::jwt::JwtService;
use super::throttle::LoginThrottle;
use crate::config::TOKEN_TYPE_BEARER;
use crate::domain::user::{normalize_email, validate_email, validate_name};
use crate::domain::{Claims, DomainEvent, JwtToken, Password, User, UserResponse, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token lifetime in seconds
    #[schema(example = 3600)]
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl TokenResponse {
    pub fn new(token: JwtToken, user: User) -> Self {
        let now = Utc::now();
        Self {
            expires_in: token.remaining_seconds(now),
            expires_at: token.expires_at(),
            access_token: token.into_string(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            user: UserResponse::from(user),
        }
    }
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials and record the attempt; returns the active user.
    async fn authenticate(&self, email: &str, password: &str, ip_address: Option<&str>) -> AppResult<User>;

    /// Authenticate and issue an access token
    async fn login(&self, email: &str, password: &str, ip_address: Option<&str>) -> AppResult<TokenResponse>;

    /// Public self-registration with the `user` role
    async fn register(&self, email: &str, password: &str, name: &str) -> AppResult<User>;

    /// Verify signature, issuer, expiry and revocation
    async fn verify_token(&self, token: &str) -> AppResult<Claims>;

    /// Swap a valid token for a new one, revoking the old `jti`
    async fn refresh(&self, claims: &Claims) -> AppResult<TokenResponse>;

    /// Revoke the token's `jti`
    async fn logout(&self, claims: &Claims) -> AppResult<()>;
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    jwt: JwtService,
    throttle: LoginThrottle<U>,
    events: Arc<EventDispatcher>,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(
        uow: Arc<U>,
        jwt: JwtService,
        throttle: LoginThrottle<U>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            uow,
            jwt,
            throttle,
            events,
        }
    }

    async fn revoke(&self, claims: &Claims) -> AppResult<()> {
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now);
        self.uow
            .revoked_tokens()
            .revoke(claims.jti.clone(), claims.sub, expires_at)
            .await
    }

    async fn fail_login(&self, email: &str, ip_address: Option<&str>, reason: &str) -> AppError {
        if let Err(e) = self.throttle.record_failure(email, ip_address).await {
            return e;
        }
        tracing::info!(email = %email, ip = ?ip_address, reason, "Login failed");
        self.events
            .dispatch(DomainEvent::LoginFailed {
                email: email.to_string(),
                ip_address: ip_address.map(str::to_string),
                reason: reason.to_string(),
            })
            .await;
        AppError::InvalidCredentials
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn authenticate(&self, email: &str, password: &str, ip_address: Option<&str>) -> AppResult<User> {
        let email = normalize_email(email);
        self.throttle.check(&email, ip_address).await?;

        let user = self.uow.users().find_by_email(&email).await?;

        // Verify against a dummy hash when the user is unknown so both
        // paths cost one argon2 verification
        let password_valid = match &user {
            Some(user) => Password::from_hash(user.password_hash.clone()).verify(password),
            None => Password::verify_dummy(password),
        };

        let mut user = match user {
            Some(user) if password_valid => user,
            Some(_) => return Err(self.fail_login(&email, ip_address, "invalid_password").await),
            None => return Err(self.fail_login(&email, ip_address, "unknown_email").await),
        };

        if !user.is_active() {
            tracing::info!(user_id = %user.id, status = %user.status, "Login refused for inactive account");
            return Err(AppError::AccountInactive);
        }

        self.throttle.record_success(&email, ip_address).await?;
        user.record_login();
        let user = self.uow.users().update(user).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        self.events
            .dispatch(DomainEvent::UserLoggedIn {
                user_id: user.id,
                ip_address: ip_address.map(str::to_string),
            })
            .await;

        Ok(user)
    }

    async fn login(&self, email: &str, password: &str, ip_address: Option<&str>) -> AppResult<TokenResponse> {
        let user = self.authenticate(email, password, ip_address).await?;
        let token = self.jwt.issue(&user)?;
        Ok(TokenResponse::new(token, user))
    }

    async fn register(&self, email: &str, password: &str, name: &str) -> AppResult<User> {
        let email = validate_email(email)?;
        let name = validate_name(name)?;
        let password_hash = Password::new(password)?.into_string();

        if self.uow.users().exists_by_email(&email).await? {
            return Err(AppError::conflict("Email is already registered"));
        }

        let user = self
            .uow
            .users()
            .create(User::new(email, password_hash, name, UserRole::User))
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.events
            .dispatch(DomainEvent::UserRegistered {
                user_id: user.id,
                email: user.email.clone(),
            })
            .await;

        Ok(user)
    }

    async fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.jwt.decode(token)?;
        if self.uow.revoked_tokens().is_revoked(&claims.jti).await? {
            tracing::debug!(jti = %claims.jti, "Rejected revoked token");
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }

    async fn refresh(&self, claims: &Claims) -> AppResult<TokenResponse> {
        let user = self
            .uow
            .users()
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active() {
            return Err(AppError::AccountInactive);
        }

        let token = self.jwt.issue(&user)?;
        self.revoke(claims).await?;
        Ok(TokenResponse::new(token, user))
    }

    async fn logout(&self, claims: &Claims) -> AppResult<()> {
        self.revoke(claims).await?;
        tracing::info!(user_id = %claims.sub, "User logged out");
        self.events
            .dispatch(DomainEvent::UserLoggedOut { user_id: claims.sub })
            .await;
        Ok(())
    }
}
