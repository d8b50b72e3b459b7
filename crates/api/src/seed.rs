//! Optional seed account applied at startup.
//!
//! With `SEED_USER_EMAIL`, `SEED_USER_NAME` and `SEED_USER_PASSWORD` all
//! set, the account is created, or its name and password are reset if the
//! email is already registered.

use scout_core::signup::validate_signup;
use scout_db::models::user::{CreateUser, User};
use scout_db::repositories::UserRepo;
use scout_db::DbPool;

use crate::auth::password::hash_password;
use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct SeedUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl SeedUser {
    /// `None` unless all three variables are present.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            email: std::env::var("SEED_USER_EMAIL").ok()?,
            name: std::env::var("SEED_USER_NAME").ok()?,
            password: std::env::var("SEED_USER_PASSWORD").ok()?,
        })
    }
}

/// Validate the seed account with the signup rules and upsert it.
pub async fn apply(pool: &DbPool, seed: &SeedUser) -> AppResult<User> {
    let account = validate_signup(Some(&seed.email), Some(&seed.password), Some(&seed.name))?;

    let user = UserRepo::upsert(
        pool,
        &CreateUser {
            password_hash: hash_password(&account.password)?,
            email: account.email,
            name: account.name,
        },
    )
    .await?;

    Ok(user)
}
