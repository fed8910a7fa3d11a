//! Documentation pages.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::api::extractors::Locale;
use crate::api::pages::{error_page, render, PageContext};
use crate::api::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/docs", get(index))
        .route("/docs/*path", get(page))
}

async fn index(State(state): State<AppState>, Locale(locale): Locale, jar: CookieJar) -> Response {
    let ctx = match PageContext::load(&state, &jar, &locale).await {
        Ok(ctx) => ctx,
        Err(e) => return error_page(&state, &PageContext::new(locale), e),
    };

    match state.services.docs().index().await {
        Ok(docs) => {
            let title = ctx.t(&state, "docs.title");
            render(&state, &ctx, "docs_index", StatusCode::OK, json!({ "title": title, "docs": docs }))
        }
        Err(e) => error_page(&state, &ctx, e),
    }
}

async fn page(
    State(state): State<AppState>,
    Locale(locale): Locale,
    jar: CookieJar,
    Path(path): Path<String>,
) -> Response {
    let ctx = match PageContext::load(&state, &jar, &locale).await {
        Ok(ctx) => ctx,
        Err(e) => return error_page(&state, &PageContext::new(locale), e),
    };

    match state.services.docs().page(&path).await {
        Ok(doc) => {
            let title = doc.title.clone();
            render(&state, &ctx, "docs_page", StatusCode::OK, json!({ "title": title, "doc": doc }))
        }
        Err(e) => error_page(&state, &ctx, e),
    }
}
