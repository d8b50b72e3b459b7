//! Credentials and sessions: Argon2id password hashes in [`password`],
//! HS256 session tokens in [`jwt`].

pub mod jwt;
pub mod password;
