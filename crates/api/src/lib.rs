//! Account service for the research dashboard: signup, login and session
//! lookup over a Postgres `users` table.
//!
//! The binary in `main.rs` and the integration tests both assemble the
//! service through [`router::build_app_router`].

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod seed;
pub mod state;
