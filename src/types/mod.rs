//! Shared types used across handlers and services.

mod pagination;
mod response;

pub use pagination::{
    Paginated, PaginatedArticles, PaginatedUsers, PaginationMeta, PaginationParams, UserFilter,
};
pub use response::{ApiResponse, Created, NoContent};
