//! Client side of the Scout research assistant.
//!
//! - [`api`] -- HTTP client for the external research server.
//! - [`poller`] -- fixed-cadence report status poller.
//! - [`dashboard`] -- connectivity indicator, report cache and poller registry.
//! - [`config`] -- environment-driven client configuration.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod poller;
