//! CSRF token generation and validation.
//!
//! Tokens live on the server-side session and must be echoed back in the
//! `csrf_token` form field or the `X-CSRF-Token` header.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::config::CSRF_TOKEN_BYTES;
use crate::errors::{AppError, AppResult};

/// CSRF service for generating and validating tokens
#[derive(Clone, Debug)]
pub struct CsrfService {
    /// Token length in bytes (before base64 encoding)
    token_bytes: usize,
}

impl CsrfService {
    pub fn new(token_bytes: usize) -> Self {
        Self { token_bytes }
    }

    /// Generate a URL-safe base64 token from a CSPRNG
    pub fn generate_token(&self) -> String {
        random_token(self.token_bytes)
    }

    /// Constant-time comparison of the submitted token with the session's.
    pub fn validate_token(&self, provided: &str, expected: &str) -> bool {
        if provided.len() != expected.len() || expected.is_empty() {
            return false;
        }
        provided.as_bytes().ct_eq(expected.as_bytes()).into()
    }

    /// Reject a missing or mismatched token with 403.
    pub fn verify(&self, provided: Option<&str>, expected: &str) -> AppResult<()> {
        match provided {
            Some(token) if self.validate_token(token, expected) => Ok(()),
            _ => {
                tracing::warn!("CSRF token validation failed");
                Err(AppError::CsrfMismatch)
            }
        }
    }
}

impl Default for CsrfService {
    fn default() -> Self {
        Self::new(CSRF_TOKEN_BYTES)
    }
}

/// Random URL-safe identifier of `bytes` bytes of entropy
pub fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length_and_alphabet() {
        let token = CsrfService::default().generate_token();
        // 32 bytes = 43 base64 characters (URL-safe, no padding)
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_are_unique() {
        let service = CsrfService::default();
        assert_ne!(service.generate_token(), service.generate_token());
    }

    #[test]
    fn test_validate_token() {
        let service = CsrfService::default();
        let token = service.generate_token();

        assert!(service.validate_token(&token, &token));
        assert!(!service.validate_token(&token[..10], &token));
        assert!(!service.validate_token(&service.generate_token(), &token));
        assert!(!service.validate_token("", ""));
    }

    #[test]
    fn test_verify_maps_to_forbidden() {
        let service = CsrfService::default();
        let token = service.generate_token();

        assert!(service.verify(Some(&token), &token).is_ok());
        assert!(matches!(
            service.verify(None, &token),
            Err(AppError::CsrfMismatch)
        ));
    }
}
