//! Integration tests for the HTTP API.
//!
//! Every test builds the real router over a temporary SQLite database and
//! drives it with `oneshot`, without binding a socket.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use hdm_boot::commands::user::create as create_user;
use hdm_boot::config::Config;
use hdm_boot::domain::UserRole;
use hdm_boot::infra::Database;
use hdm_boot::services::NewUser;
use hdm_boot::{create_router, AppState};

const PROBLEM_JSON: &str = "application/problem+json";

// =============================================================================
// Test Helpers
// =============================================================================

struct TestApp {
    _dir: TempDir,
    router: Router,
    state: AppState,
}

struct TestResponse {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// `name=value` pair of the first Set-Cookie header for `name`
    fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&format!("{}=", name)))
            .map(str::to_string)
    }
}

fn write_article(dir: &Path, file: &str, front: &str, body: &str) {
    std::fs::write(dir.join(file), format!("---\n{}\n---\n{}\n", front, body)).unwrap();
}

async fn spawn_app() -> TestApp {
    spawn_app_with(&[]).await
}

async fn spawn_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let resources = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources");

    let articles = root.join("articles");
    std::fs::create_dir_all(&articles).unwrap();
    write_article(
        &articles,
        "hello.md",
        "title: Hello World\npublished_at: \"2024-01-10\"\ncategory: News\ntags: [rust, intro]",
        "First **post** body.",
    );
    write_article(
        &articles,
        "second.md",
        "title: Second Post\npublished_at: \"2024-02-10\"\ncategory: Guides\ntags: [rust]",
        "Another post about axum.",
    );
    write_article(&articles, "draft.md", "title: Draft\npublished: false", "Hidden.");

    let docs = root.join("docs");
    std::fs::create_dir_all(docs.join("guide")).unwrap();
    std::fs::write(docs.join("index.md"), "# Start here\n\nWelcome.").unwrap();
    std::fs::write(docs.join("guide/setup.md"), "# Setup\n\nRun it.").unwrap();

    let mut values: HashMap<String, String> = HashMap::from([
        ("APP_ENV".into(), "testing".into()),
        ("APP_DEBUG".into(), "false".into()),
        ("JWT_SECRET".into(), "integration-test-secret-at-least-32-chars".into()),
        ("LOGIN_MAX_ATTEMPTS".into(), "3".into()),
        ("CONTENT_PATH".into(), articles.display().to_string()),
        ("DOCS_PATH".into(), docs.display().to_string()),
        ("STORAGE_PATH".into(), root.join("var").display().to_string()),
        ("LOG_PATH".into(), root.join("var/logs").display().to_string()),
        ("TRANSLATIONS_PATH".into(), resources.join("translations").display().to_string()),
        ("THEMES_PATH".into(), resources.join("themes").display().to_string()),
    ]);
    for (key, value) in overrides {
        values.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_lookup(|key| values.get(key).cloned()).unwrap();
    let url = format!("sqlite://{}?mode=rwc", root.join("app.db").display());
    let db = Database::connect(&url).await.unwrap();
    let state = AppState::build(config, db).unwrap();

    TestApp {
        _dir: dir,
        router: create_router(state.clone()),
        state,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        TestResponse { status, headers, body }
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn form(&self, uri: &str, cookie: Option<&str>, body: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn create_user(&self, email: &str, role: UserRole) {
        let input = NewUser {
            email: email.to_string(),
            password: "Secret123".to_string(),
            name: "Test Person".to_string(),
            role,
        };
        create_user(&self.state.database, input).await.unwrap();
    }

    async fn login(&self, email: &str) -> String {
        let response = self
            .json(
                Method::POST,
                "/api/auth/login",
                None,
                json!({"email": email, "password": "Secret123"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["data"]["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_register_login_me_logout() {
    let app = spawn_app().await;

    let response = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            json!({"email": "New@Example.com", "password": "Secret123", "name": "Newbie"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["data"]["email"], "new@example.com");
    assert_eq!(response.json()["data"]["role"], "user");

    let token = app.login("new@example.com").await;

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["data"]["name"], "Newbie");
    assert_eq!(me.json()["data"]["login_count"], 1);

    let logout = app.json(Method::POST, "/api/auth/logout", Some(&token), json!({})).await;
    assert_eq!(logout.status, StatusCode::OK);

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.content_type(), PROBLEM_JSON);
}

#[tokio::test]
async fn test_register_duplicate_and_weak_password() {
    let app = spawn_app().await;
    app.create_user("taken@example.com", UserRole::User).await;

    let duplicate = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            json!({"email": "taken@example.com", "password": "Secret123", "name": "Again"}),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let weak = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            json!({"email": "weak@example.com", "password": "short", "name": "Weak"}),
        )
        .await;
    assert_eq!(weak.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(weak.json()["errors"]["password"].is_array());
}

#[tokio::test]
async fn test_refresh_revokes_old_token() {
    let app = spawn_app().await;
    app.create_user("refresh@example.com", UserRole::User).await;
    let token = app.login("refresh@example.com").await;

    let refreshed = app.json(Method::POST, "/api/auth/refresh", Some(&token), json!({})).await;
    assert_eq!(refreshed.status, StatusCode::OK);
    let new_token = refreshed.json()["data"]["access_token"].as_str().unwrap().to_string();
    assert_eq!(refreshed.json()["data"]["token_type"], "Bearer");

    assert_eq!(app.get("/api/auth/me", Some(&token)).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/auth/me", Some(&new_token)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_failed_logins_are_throttled() {
    let app = spawn_app().await;
    app.create_user("victim@example.com", UserRole::User).await;

    for _ in 0..3 {
        let response = app
            .json(
                Method::POST,
                "/api/auth/login",
                None,
                json!({"email": "victim@example.com", "password": "Wrong1234"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.json()["type"], "https://hdm-boot.dev/problems/invalid-credentials");
    }

    // Even the right password is refused while blocked
    let blocked = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "victim@example.com", "password": "Secret123"}),
        )
        .await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(blocked.headers.contains_key(header::RETRY_AFTER));
    assert!(blocked.json()["retry_after"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_forwarded_header_does_not_dodge_ip_throttle() {
    let app = spawn_app_with(&[("LOGIN_MAX_IP_ATTEMPTS", "2")]).await;
    let peer: SocketAddr = "203.0.113.7:40000".parse().unwrap();

    let attempt = |n: usize| {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", format!("198.51.100.{}", n))
            .body(Body::from(
                json!({"email": format!("target{}@example.com", n), "password": "Wrong1234"}).to_string(),
            ))
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        request
    };

    assert_eq!(app.send(attempt(1)).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.send(attempt(2)).await.status, StatusCode::UNAUTHORIZED);
    let blocked = app.send(attempt(3)).await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_inactive_account_cannot_log_in() {
    let app = spawn_app().await;
    app.create_user("admin@example.com", UserRole::Admin).await;
    app.create_user("sleepy@example.com", UserRole::User).await;
    let admin = app.login("admin@example.com").await;
    let user_token = app.login("sleepy@example.com").await;

    let me = app.get("/api/auth/me", Some(&user_token)).await;
    let id = me.json()["data"]["id"].as_str().unwrap().to_string();
    let update = app
        .json(Method::PUT, &format!("/api/users/{}", id), Some(&admin), json!({"status": "suspended"}))
        .await;
    assert_eq!(update.status, StatusCode::OK);

    let login = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "sleepy@example.com", "password": "Secret123"}),
        )
        .await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);
    // Tokens issued before the suspension stop working too
    assert_eq!(app.get("/api/auth/me", Some(&user_token)).await.status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_user_management_permissions() {
    let app = spawn_app().await;
    app.create_user("admin@example.com", UserRole::Admin).await;
    app.create_user("plain@example.com", UserRole::User).await;
    let admin = app.login("admin@example.com").await;
    let plain = app.login("plain@example.com").await;

    assert_eq!(app.get("/api/users", Some(&plain)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/users", None).await.status, StatusCode::UNAUTHORIZED);

    let list = app.get("/api/users?per_page=1&page=2", Some(&admin)).await;
    assert_eq!(list.status, StatusCode::OK);
    let body = list.json();
    assert_eq!(body["data"]["meta"]["total"], 2);
    assert_eq!(body["data"]["meta"]["total_pages"], 2);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);

    let filtered = app.get("/api/users?role=admin", Some(&admin)).await;
    assert_eq!(filtered.json()["data"]["meta"]["total"], 1);

    let created = app
        .json(
            Method::POST,
            "/api/users",
            Some(&admin),
            json!({"email": "editor@example.com", "password": "Secret123", "name": "Eddie", "role": "editor"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);

    let stats = app.get("/api/users/statistics", Some(&admin)).await;
    assert_eq!(stats.json()["data"]["total"], 3);
    assert_eq!(stats.json()["data"]["by_role"]["editor"], 1);
}

#[tokio::test]
async fn test_admin_cannot_delete_self_but_can_delete_others() {
    let app = spawn_app().await;
    app.create_user("admin@example.com", UserRole::Admin).await;
    app.create_user("gone@example.com", UserRole::User).await;
    let admin = app.login("admin@example.com").await;
    let doomed = app.login("gone@example.com").await;

    let admin_id = app.get("/api/auth/me", Some(&admin)).await.json()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let doomed_id = app.get("/api/auth/me", Some(&doomed)).await.json()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let own = app
        .send(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/users/{}", admin_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(own.status, StatusCode::CONFLICT);

    let other = app
        .send(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/users/{}", doomed_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(other.status, StatusCode::NO_CONTENT);

    // The deleted user's token no longer resolves to an account
    assert_eq!(app.get("/api/auth/me", Some(&doomed)).await.status, StatusCode::UNAUTHORIZED);
    let missing = app.get(&format!("/api/users/{}", doomed_id), Some(&admin)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_self_password_change_requires_current_password() {
    let app = spawn_app().await;
    app.create_user("self@example.com", UserRole::User).await;
    let token = app.login("self@example.com").await;
    let id = app.get("/api/auth/me", Some(&token)).await.json()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/users/{}/password", id);

    let missing = app
        .json(Method::PUT, &uri, Some(&token), json!({"new_password": "Better123"}))
        .await;
    assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(missing.json()["errors"]["current_password"].is_array());

    let changed = app
        .json(
            Method::PUT,
            &uri,
            Some(&token),
            json!({"current_password": "Secret123", "new_password": "Better123"}),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);

    let login = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "self@example.com", "password": "Better123"}),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

// =============================================================================
// Error handling
// =============================================================================

#[tokio::test]
async fn test_framework_errors_become_problems() {
    let app = spawn_app().await;

    let missing = app.get("/api/nothing-here", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.content_type(), PROBLEM_JSON);
    assert_eq!(missing.json()["instance"], "/api/nothing-here");

    let wrong_method = app.get("/api/auth/login", None).await;
    assert_eq!(wrong_method.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(wrong_method.content_type(), PROBLEM_JSON);
    assert_eq!(wrong_method.json()["status"], 405);

    let malformed = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.content_type(), PROBLEM_JSON);

    let invalid = app
        .json(Method::POST, "/api/auth/login", None, json!({"email": "nope", "password": ""}))
        .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = invalid.json();
    assert_eq!(body["type"], "https://hdm-boot.dev/problems/validation-error");
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

// =============================================================================
// Monitoring
// =============================================================================

#[tokio::test]
async fn test_health_and_status() {
    let app = spawn_app().await;

    let health = app.get("/health", None).await;
    assert_eq!(health.status, StatusCode::OK, "{}", health.text());
    let checks: Vec<_> = health.json()["checks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(checks, vec!["database", "filesystem", "runtime"]);

    let single = app.get("/health/database", None).await;
    assert_eq!(single.json()["status"], "healthy");
    assert_eq!(app.get("/health/bogus", None).await.status, StatusCode::NOT_FOUND);

    let status = app.get("/_status", None).await;
    let body = status.json();
    assert_eq!(body["app_name"], "HDM Boot");
    assert_eq!(body["environment"], "testing");
    assert_eq!(body["modules"].as_array().unwrap().len(), 9);
    // The health request above was timed
    assert!(body["metrics"]["http.request"]["count"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_metrics_need_monitoring_permission() {
    let app = spawn_app().await;
    app.create_user("admin@example.com", UserRole::Admin).await;
    app.create_user("editor@example.com", UserRole::Editor).await;
    let admin = app.login("admin@example.com").await;
    let editor = app.login("editor@example.com").await;

    assert_eq!(
        app.get("/api/monitoring/metrics", Some(&editor)).await.status,
        StatusCode::FORBIDDEN
    );
    let metrics = app.get("/api/monitoring/metrics", Some(&admin)).await;
    assert_eq!(metrics.status, StatusCode::OK);
    assert!(metrics.json()["data"].is_object());
}

// =============================================================================
// Blog and docs
// =============================================================================

#[tokio::test]
async fn test_blog_json_api() {
    let app = spawn_app().await;

    let list = app.get("/api/blog/articles", None).await;
    let body = list.json();
    let slugs: Vec<_> = body["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["slug"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(slugs, vec!["second", "hello"]);

    let by_tag = app.get("/api/blog/articles?tag=intro", None).await;
    assert_eq!(by_tag.json()["data"]["meta"]["total"], 1);

    let article = app.get("/api/blog/articles/hello", None).await;
    assert_eq!(article.status, StatusCode::OK);
    assert!(article.json()["data"]["content_html"]
        .as_str()
        .unwrap()
        .contains("<strong>post</strong>"));

    assert_eq!(app.get("/api/blog/articles/draft", None).await.status, StatusCode::NOT_FOUND);

    let tags = app.get("/api/blog/tags", None).await;
    assert_eq!(tags.json()["data"][0], json!({"name": "rust", "count": 2}));
}

#[tokio::test]
async fn test_blog_create_requires_permission() {
    let app = spawn_app().await;
    app.create_user("editor@example.com", UserRole::Editor).await;
    app.create_user("reader@example.com", UserRole::User).await;
    let editor = app.login("editor@example.com").await;
    let reader = app.login("reader@example.com").await;
    let article = json!({"title": "Fresh Take", "content": "Body", "tags": ["news"]});

    assert_eq!(
        app.json(Method::POST, "/api/blog/articles", None, article.clone()).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.json(Method::POST, "/api/blog/articles", Some(&reader), article.clone()).await.status,
        StatusCode::FORBIDDEN
    );

    let created = app.json(Method::POST, "/api/blog/articles", Some(&editor), article.clone()).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text());
    assert_eq!(created.json()["data"]["slug"], "fresh-take");
    assert_eq!(created.json()["data"]["author"], "Test Person");

    let again = app.json(Method::POST, "/api/blog/articles", Some(&editor), article).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(app.get("/api/blog/articles/fresh-take", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_blog_and_docs_pages() {
    let app = spawn_app().await;

    let index = app.get("/blog", None).await;
    assert_eq!(index.status, StatusCode::OK);
    assert!(index.content_type().starts_with("text/html"));
    assert!(index.text().contains("Hello World"));
    assert!(!index.text().contains("Draft"));

    let category = app.get("/blog/category/guides", None).await;
    assert!(category.text().contains("Second Post"));
    assert!(!category.text().contains("Hello World"));

    let missing = app.get("/blog/article/nope", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.content_type().starts_with("text/html"));

    let docs = app.get("/docs", None).await;
    assert!(docs.text().contains("Start here"));
    let page = app.get("/docs/guide/setup", None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.text().contains("<h1>Setup</h1>"));
    assert_eq!(app.get("/docs/../secret", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_localized_pages() {
    let app = spawn_app().await;
    let page = app.get("/blog?lang=sk", None).await;
    assert!(page.text().contains("lang=\"sk\""));

    let request = Request::builder()
        .uri("/login")
        .header(header::ACCEPT_LANGUAGE, "cs-CZ,cs;q=0.9,en;q=0.5")
        .body(Body::empty())
        .unwrap();
    assert!(app.send(request).await.text().contains("lang=\"cs\""));
}

// =============================================================================
// Modules
// =============================================================================

#[tokio::test]
async fn test_disabled_modules_have_no_routes() {
    let app = spawn_app_with(&[("ENABLED_MODULES", "docs")]).await;

    assert_eq!(app.get("/blog", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/api/themes", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/docs", None).await.status, StatusCode::OK);

    let home = app.get("/", None).await;
    assert_eq!(home.headers.get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_home_redirects_to_blog() {
    let app = spawn_app().await;
    let home = app.get("/", None).await;
    assert_eq!(home.status, StatusCode::SEE_OTHER);
    assert_eq!(home.headers.get(header::LOCATION).unwrap(), "/blog");
}

// =============================================================================
// Web sessions
// =============================================================================

#[tokio::test]
async fn test_web_login_rotates_session() {
    let app = spawn_app().await;
    app.create_user("web@example.com", UserRole::User).await;

    let csrf = app.get("/api/auth/csrf-token", None).await;
    let guest_cookie = csrf.cookie("hdm_session").unwrap();
    let token = csrf.json()["data"]["csrf_token"].as_str().unwrap().to_string();

    let bad = app
        .form(
            "/login",
            Some(&guest_cookie),
            "email=web%40example.com&password=Secret123&csrf_token=forged",
        )
        .await;
    assert_eq!(bad.status, StatusCode::FORBIDDEN);
    assert!(bad.content_type().starts_with("text/html"));

    let wrong = app
        .form(
            "/login",
            Some(&guest_cookie),
            &format!("email=web%40example.com&password=Nope12345&csrf_token={}", token),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert!(wrong.text().contains("Invalid email or password."));

    let ok = app
        .form(
            "/login",
            Some(&guest_cookie),
            &format!("email=web%40example.com&password=Secret123&csrf_token={}", token),
        )
        .await;
    assert_eq!(ok.status, StatusCode::SEE_OTHER);
    assert_eq!(ok.headers.get(header::LOCATION).unwrap(), "/profile");
    let user_cookie = ok.cookie("hdm_session").unwrap();
    assert_ne!(user_cookie, guest_cookie);

    let profile = app
        .send(
            Request::builder()
                .uri("/profile")
                .header(header::COOKIE, &user_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert!(profile.text().contains("web@example.com"));

    // The pre-login session id is gone
    let stale = app
        .send(
            Request::builder()
                .uri("/profile")
                .header(header::COOKIE, &guest_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(stale.status, StatusCode::SEE_OTHER);
}

// =============================================================================
// Language and themes
// =============================================================================

#[tokio::test]
async fn test_language_endpoints() {
    let app = spawn_app().await;

    let set = app.json(Method::POST, "/api/language", None, json!({"locale": "sk"})).await;
    assert_eq!(set.status, StatusCode::OK);
    assert_eq!(set.cookie("locale").unwrap(), "locale=sk");
    assert_eq!(set.json()["data"]["current"], "sk");

    let unsupported = app.json(Method::POST, "/api/language", None, json!({"locale": "de"})).await;
    assert_eq!(unsupported.status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .uri("/api/language")
        .header(header::COOKIE, "locale=cs")
        .body(Body::empty())
        .unwrap();
    let current = app.send(request).await.json();
    assert_eq!(current["data"]["current"], "cs");
    assert_eq!(current["data"]["default"], "en");

    let catalog = app.get("/api/language/sk/translations", None).await;
    assert_eq!(catalog.status, StatusCode::OK);
    assert!(catalog.json()["data"]["nav.blog"].is_string());
    assert_eq!(app.get("/api/language/de/translations", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_themes_and_assets() {
    let app = spawn_app().await;
    app.create_user("admin@example.com", UserRole::Admin).await;
    let admin = app.login("admin@example.com").await;

    let themes = app.get("/api/themes", None).await;
    assert_eq!(themes.json()["data"][0]["id"], "default");
    assert_eq!(app.get("/api/themes/active", None).await.json()["data"]["id"], "default");

    let css = app.get("/themes/default/assets/style.css", None).await;
    assert_eq!(css.status, StatusCode::OK);
    assert!(css.content_type().starts_with("text/css"));
    assert_eq!(
        app.get("/themes/default/assets/../theme.json", None).await.status,
        StatusCode::NOT_FOUND
    );

    let unknown = app
        .json(Method::PUT, "/api/themes/active", Some(&admin), json!({"theme": "neon"}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    let activated = app
        .json(Method::PUT, "/api/themes/active", Some(&admin), json!({"theme": "default"}))
        .await;
    assert_eq!(activated.status, StatusCode::OK);
}
