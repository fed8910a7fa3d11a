//! Blog pages and JSON API.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::extractors::{Locale, ValidatedJson};
use crate::api::middleware::{auth_middleware, CurrentUser};
use crate::api::pages::{error_page, render, PageContext};
use crate::api::AppState;
use crate::config::BLOG_PAGE_SIZE;
use crate::domain::{ArticleDetail, ArticleSummary};
use crate::errors::AppResult;
use crate::services::{ArticleQuery, NewArticle, TermCount};
use crate::types::{ApiResponse, Created, Paginated, PaginatedArticles, PaginationParams};

/// Article listing filters; at most one of `category`, `tag` and `q` applies,
/// in that order
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ArticleListParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub category: Option<String>,
    pub tag: Option<String>,
    /// Full-text search over title, excerpt and content
    pub q: Option<String>,
}

impl ArticleListParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page.unwrap_or(1), self.per_page.unwrap_or(BLOG_PAGE_SIZE))
    }

    fn query(&self) -> ArticleQuery {
        let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        if let Some(category) = non_empty(&self.category) {
            ArticleQuery::Category(category)
        } else if let Some(tag) = non_empty(&self.tag) {
            ArticleQuery::Tag(tag)
        } else if let Some(q) = non_empty(&self.q) {
            ArticleQuery::Search(q)
        } else {
            ArticleQuery::All
        }
    }
}

/// New article request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[schema(example = "Hello world")]
    pub title: String,
    /// Lowercase letters, digits and dashes; derived from the title when absent
    #[schema(example = "hello-world")]
    pub slug: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
    /// Markdown body
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub featured: bool,
}

fn default_published() -> bool {
    true
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let create = post(create_article).route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/blog", get(index_page))
        .route("/blog/article/:slug", get(article_page))
        .route("/blog/category/:category", get(category_page))
        .route("/blog/tag/:tag", get(tag_page))
        .route("/api/blog/articles", get(list_articles).merge(create))
        .route("/api/blog/articles/:slug", get(get_article))
        .route("/api/blog/categories", get(list_categories))
        .route("/api/blog/tags", get(list_tags))
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

/// Published articles, newest first
#[utoipa::path(
    get,
    path = "/api/blog/articles",
    tag = "Blog",
    params(ArticleListParams),
    responses(
        (status = 200, description = "Page of article summaries", body = PaginatedArticles)
    )
)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(params): Query<ArticleListParams>,
) -> AppResult<Json<ApiResponse<Paginated<ArticleSummary>>>> {
    let page = state
        .services
        .blog()
        .list(params.query(), params.pagination())
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// Publish a new markdown article
#[utoipa::path(
    post,
    path = "/api/blog/articles",
    tag = "Blog",
    security(("bearer_auth" = [])),
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article written", body = ArticleDetail),
        (status = 403, description = "Missing blog.create"),
        (status = 409, description = "Slug already exists"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_article(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateArticleRequest>,
) -> AppResult<Created<ArticleDetail>> {
    let input = NewArticle {
        title: payload.title,
        slug: payload.slug,
        category: payload.category,
        tags: payload.tags,
        excerpt: payload.excerpt,
        content: payload.content,
        published: payload.published,
        featured: payload.featured,
    };
    let article = state.services.blog().create(&current_user.user, input).await?;
    Ok(Created(article))
}

/// Published article with rendered HTML
#[utoipa::path(
    get,
    path = "/api/blog/articles/{slug}",
    tag = "Blog",
    params(
        ("slug" = String, Path, description = "Article slug")
    ),
    responses(
        (status = 200, description = "Article", body = ArticleDetail),
        (status = 404, description = "Article not found")
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ArticleDetail>>> {
    let article = state.services.blog().article(&slug).await?;
    Ok(Json(ApiResponse::success(article)))
}

/// Categories with article counts
#[utoipa::path(
    get,
    path = "/api/blog/categories",
    tag = "Blog",
    responses(
        (status = 200, description = "Categories", body = Vec<TermCount>)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<TermCount>>>> {
    Ok(Json(ApiResponse::success(state.services.blog().categories().await?)))
}

/// Tags with article counts
#[utoipa::path(
    get,
    path = "/api/blog/tags",
    tag = "Blog",
    responses(
        (status = 200, description = "Tags", body = Vec<TermCount>)
    )
)]
pub async fn list_tags(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<TermCount>>>> {
    Ok(Json(ApiResponse::success(state.services.blog().tags().await?)))
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

async fn index_page(
    State(state): State<AppState>,
    Locale(locale): Locale,
    jar: CookieJar,
    Query(params): Query<ArticleListParams>,
) -> Response {
    let query = params.query();
    let heading = match &query {
        ArticleQuery::Search(q) => Some(("blog.search", "query", q.clone())),
        _ => None,
    };
    listing(&state, &locale, &jar, query, params.page.unwrap_or(1), heading).await
}

async fn category_page(
    State(state): State<AppState>,
    Locale(locale): Locale,
    jar: CookieJar,
    Path(category): Path<String>,
    Query(params): Query<ArticleListParams>,
) -> Response {
    let heading = Some(("blog.category", "name", category.clone()));
    let page = params.page.unwrap_or(1);
    listing(&state, &locale, &jar, ArticleQuery::Category(category), page, heading).await
}

async fn tag_page(
    State(state): State<AppState>,
    Locale(locale): Locale,
    jar: CookieJar,
    Path(tag): Path<String>,
    Query(params): Query<ArticleListParams>,
) -> Response {
    let heading = Some(("blog.tag", "name", tag.clone()));
    let page = params.page.unwrap_or(1);
    listing(&state, &locale, &jar, ArticleQuery::Tag(tag), page, heading).await
}

/// Shared listing page; `heading` is a translation key with one parameter
async fn listing(
    state: &AppState,
    locale: &str,
    jar: &CookieJar,
    query: ArticleQuery,
    page: u64,
    heading: Option<(&str, &str, String)>,
) -> Response {
    let ctx = match PageContext::load(state, jar, locale).await {
        Ok(ctx) => ctx,
        Err(e) => return error_page(state, &PageContext::new(locale), e),
    };

    let blog = state.services.blog();
    let result = futures::try_join!(
        blog.list(query, PaginationParams::new(page, BLOG_PAGE_SIZE)),
        blog.categories(),
        blog.tags(),
    );
    let (articles, categories, tags) = match result {
        Ok(parts) => parts,
        Err(e) => return error_page(state, &ctx, e),
    };

    let translator = state.services.translator();
    let title = translator.translate("blog.title", &ctx.locale, &[]);
    let heading = match heading {
        Some((key, param, value)) => translator.translate(key, &ctx.locale, &[(param, &value)]),
        None => title.clone(),
    };
    let meta = &articles.meta;

    render(
        state,
        &ctx,
        "blog_index",
        StatusCode::OK,
        json!({
            "title": title,
            "heading": heading,
            "articles": articles.data,
            "prev_page": meta.has_prev().then(|| meta.page - 1),
            "next_page": meta.has_next().then(|| meta.page + 1),
            "categories": categories,
            "tags": tags,
        }),
    )
}

async fn article_page(
    State(state): State<AppState>,
    Locale(locale): Locale,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> Response {
    let ctx = match PageContext::load(&state, &jar, &locale).await {
        Ok(ctx) => ctx,
        Err(e) => return error_page(&state, &PageContext::new(locale), e),
    };

    match state.services.blog().article(&slug).await {
        Ok(article) => {
            let title = article.summary.title.clone();
            render(
                &state,
                &ctx,
                "blog_article",
                StatusCode::OK,
                json!({ "title": title, "article": article }),
            )
        }
        Err(e) => error_page(&state, &ctx, e),
    }
}
