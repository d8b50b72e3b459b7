//! Shared domain types for the Scout research assistant.
//!
//! - [`report`] -- research report model and its status state machine.
//! - [`signup`] -- signup input normalization and validation.
//! - [`error`] -- the domain error enum shared by the server crates.

pub mod error;
pub mod report;
pub mod signup;
pub mod types;
