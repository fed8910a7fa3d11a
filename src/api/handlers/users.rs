//! User management handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    middleware,
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{auth_middleware, CurrentUser};
use crate::api::AppState;
use crate::domain::{UserResponse, UserRole, UserStatus};
use crate::errors::AppResult;
use crate::services::{NewUser, UserChanges, UserStatistics};
use crate::types::{ApiResponse, Created, NoContent, Paginated, PaginatedUsers, PaginationParams, UserFilter};

/// User creation request (administrators)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "editor@example.com")]
    pub email: String,
    #[schema(example = "SecurePass123", min_length = 8)]
    pub password: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// Defaults to `user`
    #[schema(example = "editor")]
    pub role: Option<String>,
}

/// Partial user update
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
    /// Needs `user.manage_roles`
    #[schema(example = "editor")]
    pub role: Option<String>,
    /// Needs `user.manage_roles`
    #[schema(example = "suspended")]
    pub status: Option<String>,
}

/// Password change; `current_password` is required when changing your own
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Create user routes, all behind Bearer authentication
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/statistics", get(statistics))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/password", put(change_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(PaginationParams, UserFilter),
    responses(
        (status = 200, description = "Page of users", body = PaginatedUsers),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing user.view")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<UserFilter>,
) -> AppResult<Json<ApiResponse<Paginated<UserResponse>>>> {
    let users = state
        .services
        .users()
        .list_users(&current_user.user, filter, page)
        .await?;
    Ok(Json(ApiResponse::success(users.map(UserResponse::from))))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 403, description = "Missing user.create"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<Created<UserResponse>> {
    let role = match payload.role.as_deref() {
        Some(role) => UserRole::parse(role)?,
        None => UserRole::User,
    };
    let input = NewUser {
        email: payload.email,
        password: payload.password,
        name: payload.name,
        role,
    };

    let user = state
        .services
        .users()
        .create_user(Some(&current_user.user), input)
        .await?;
    Ok(Created(UserResponse::from(user)))
}

/// User counts by role and status
#[utoipa::path(
    get,
    path = "/api/users/statistics",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User statistics", body = UserStatistics),
        (status = 403, description = "Missing user.view")
    )
)]
pub async fn statistics(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<UserStatistics>>> {
    let stats = state.services.users().statistics(&current_user.user).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Get user by ID (self, or user.view)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state.services.users().view_user(&current_user.user, id).await?;
    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Cannot change own role or status"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let changes = UserChanges {
        name: payload.name,
        role: payload.role.as_deref().map(UserRole::parse).transpose()?,
        status: payload.status.as_deref().map(UserStatus::parse).transpose()?,
    };

    let user = state
        .services
        .users()
        .update_user(&current_user.user, id, changes)
        .await?;
    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Missing user.delete"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Cannot delete yourself")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state.services.users().delete_user(&current_user.user, id).await?;
    Ok(NoContent)
}

/// Change a user's password
#[utoipa::path(
    put,
    path = "/api/users/{id}/password",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Wrong current password or weak new password")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .services
        .users()
        .change_password(&current_user.user, id, payload.current_password, payload.new_password)
        .await?;
    Ok(Json(ApiResponse::message("Password changed")))
}
