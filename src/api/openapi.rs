//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth, blog, health, language, theme, users};
use crate::domain::{
    ArticleDetail, ArticleSummary, HealthCheckResult, HealthReport, HealthStatus, UserResponse,
};
use crate::modules::{ModuleDescriptor, ModuleKind};
use crate::services::{MetricSummary, TermCount, ThemeInfo, TokenResponse, UserStatistics};
use crate::types::{PaginatedArticles, PaginatedUsers, PaginationMeta};

/// OpenAPI documentation for the HDM Boot API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "HDM Boot",
        description = "Modular monolith backend: authentication, users, blog, themes, i18n and monitoring",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth::register,
        auth::login,
        auth::refresh,
        auth::logout,
        auth::me,
        auth::csrf_token,
        // User endpoints
        users::list_users,
        users::create_user,
        users::statistics,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::change_password,
        // Blog
        blog::list_articles,
        blog::create_article,
        blog::get_article,
        blog::list_categories,
        blog::list_tags,
        // Monitoring
        health::health,
        health::health_check,
        health::status,
        health::metrics,
        // Language
        language::current,
        language::set_language,
        language::translations,
        // Themes
        theme::list_themes,
        theme::active_theme,
        theme::activate_theme,
    ),
    components(
        schemas(
            // Domain types
            UserResponse,
            ArticleSummary,
            ArticleDetail,
            HealthStatus,
            HealthCheckResult,
            HealthReport,
            // Request bodies
            auth::RegisterRequest,
            auth::LoginRequest,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            users::ChangePasswordRequest,
            blog::CreateArticleRequest,
            language::SetLanguageRequest,
            theme::ActivateThemeRequest,
            // Responses
            TokenResponse,
            auth::CsrfTokenResponse,
            UserStatistics,
            PaginatedUsers,
            PaginatedArticles,
            PaginationMeta,
            TermCount,
            MetricSummary,
            ModuleKind,
            ModuleDescriptor,
            health::HealthSummary,
            health::StatusResponse,
            language::LanguageResponse,
            ThemeInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token lifecycle"),
        (name = "Users", description = "User management operations"),
        (name = "Blog", description = "Markdown articles"),
        (name = "Monitoring", description = "Health checks, status and metrics"),
        (name = "Language", description = "Locales and translations"),
        (name = "Themes", description = "Theme selection")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_module_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users/{id}/password",
            "/api/blog/articles",
            "/_status",
            "/api/language/{locale}/translations",
            "/api/themes/active",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        assert!(doc
            .components
            .as_ref()
            .unwrap()
            .security_schemes
            .contains_key("bearer_auth"));
    }
}
