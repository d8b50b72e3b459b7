//! Request handlers. Handlers delegate to the repositories in `scout_db`
//! and map errors via [`AppError`](crate::error::AppError).

pub mod auth;
