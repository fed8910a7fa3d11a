//! HTTP request handlers, one module per feature.
//!
//! Each module exposes a `routes` function returning its router fragment;
//! feature modules decide where the fragments are mounted.

pub mod auth;
pub mod blog;
pub mod docs;
pub mod health;
pub mod language;
pub mod theme;
pub mod users;
pub mod web;
