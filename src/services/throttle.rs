//! Login throttling over the `login_attempts` table.
//!
//! Failed attempts are counted per email and per client IP inside a sliding
//! window. Reaching either limit blocks further attempts until enough
//! failures have aged out of the window.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

pub struct LoginThrottle<U: UnitOfWork> {
    uow: Arc<U>,
    max_attempts: u64,
    max_ip_attempts: u64,
    window: Duration,
}

impl<U: UnitOfWork> LoginThrottle<U> {
    pub fn new(uow: Arc<U>, max_attempts: u64, max_ip_attempts: u64, window: Duration) -> Self {
        Self {
            uow,
            max_attempts,
            max_ip_attempts,
            window,
        }
    }

    pub fn from_config(uow: Arc<U>, config: &Config) -> Self {
        Self::new(
            uow,
            config.login_max_attempts,
            config.login_max_ip_attempts,
            Duration::minutes(config.login_lockout_minutes),
        )
    }

    /// Fail with 429 when the email or the IP is over its limit.
    pub async fn check(&self, email: &str, ip_address: Option<&str>) -> AppResult<()> {
        let now = Utc::now();
        let since = now - self.window;
        let repo = self.uow.login_attempts();

        let by_email = repo.failures_for_email(email, since).await?;
        let mut retry = retry_after(&by_email, self.max_attempts, self.window, now);

        if let Some(ip) = ip_address {
            let by_ip = repo.failures_for_ip(ip, since).await?;
            retry = retry.max(retry_after(&by_ip, self.max_ip_attempts, self.window, now));
        }

        match retry {
            Some(retry_after) => {
                tracing::warn!(email = %email, ip = ?ip_address, retry_after, "Login throttled");
                Err(AppError::TooManyRequests { retry_after })
            }
            None => Ok(()),
        }
    }

    pub async fn record_failure(&self, email: &str, ip_address: Option<&str>) -> AppResult<()> {
        self.uow
            .login_attempts()
            .record(email.to_string(), ip_address.map(str::to_string), false, Utc::now())
            .await
    }

    /// Log the success and reset the email's failure count
    pub async fn record_success(&self, email: &str, ip_address: Option<&str>) -> AppResult<()> {
        let repo = self.uow.login_attempts();
        repo.record(email.to_string(), ip_address.map(str::to_string), true, Utc::now())
            .await?;
        repo.clear_failures(email).await?;
        Ok(())
    }

    /// Prune attempts older than `older_than`
    pub async fn cleanup(&self, older_than: Duration) -> AppResult<u64> {
        self.uow
            .login_attempts()
            .delete_older_than(Utc::now() - older_than)
            .await
    }
}

/// Seconds until the failure count drops below `max`, or `None` when not blocked.
///
/// `failures` must be the in-window failure timestamps, oldest first.
pub fn retry_after(
    failures: &[DateTime<Utc>],
    max: u64,
    window: Duration,
    now: DateTime<Utc>,
) -> Option<u64> {
    let max = usize::try_from(max).unwrap_or(usize::MAX).max(1);
    if failures.len() < max {
        return None;
    }
    // Once this one leaves the window only max - 1 failures remain
    let pivot = failures[failures.len() - max];
    let seconds = (pivot + window - now).num_seconds();
    Some(seconds.max(1) as u64)
}
