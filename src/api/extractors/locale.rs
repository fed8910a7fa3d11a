//! Request locale.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::ACCEPT_LANGUAGE, request::Parts},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::api::AppState;
use crate::config::LOCALE_COOKIE;

#[derive(Debug, Default, Deserialize)]
struct LocaleQuery {
    lang: Option<String>,
}

/// Locale for the current request: `?lang=`, then the locale cookie, then
/// `Accept-Language`, then the default locale.
#[derive(Debug, Clone, PartialEq)]
pub struct Locale(pub String);

impl Locale {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Locale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let query = Query::<LocaleQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();
        let jar = CookieJar::from_headers(&parts.headers);
        let accept_language = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());

        let locale = state.services.translator().resolve(
            query.lang.as_deref(),
            jar.get(LOCALE_COOKIE).map(|c| c.value()),
            accept_language,
        );
        Ok(Locale(locale))
    }
}
