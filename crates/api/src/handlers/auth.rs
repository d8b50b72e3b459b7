//! Account handlers: signup, login and the current-user lookup.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use scout_core::error::CoreError;
use scout_core::signup::{normalize_email, validate_signup};
use scout_db::models::user::{CreateUser, UserResponse};
use scout_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Same message for an unknown email and a wrong password.
const INVALID_CREDENTIALS_MSG: &str = "Invalid email or password";

/// `POST /api/auth/signup` body. Every field is optional so an absent
/// field is reported like a blank one.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

/// `POST /api/auth/login` body. Missing fields get the same 401 as wrong
/// credentials.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until `access_token` expires.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let account = validate_signup(
        input.email.as_deref(),
        input.password.as_deref(),
        input.name.as_deref(),
    )?;

    if UserRepo::email_exists(&state.pool, &account.email).await? {
        tracing::debug!("Signup rejected: email already registered");
        return Err(AppError::conflict("User already exists"));
    }

    let new_user = CreateUser {
        password_hash: hash_password(&account.password)?,
        email: account.email,
        name: account.name,
    };
    // Two signups racing past the existence check are settled by
    // `uq_users_email`.
    let user = UserRepo::create(&state.pool, &new_user).await?;

    tracing::info!(user_id = user.id, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully",
            user: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (input.email, input.password) else {
        tracing::debug!("Login rejected: missing credentials");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS_MSG));
    };
    let email = normalize_email(&email);

    let Some(user) = UserRepo::find_by_email(&state.pool, &email).await? else {
        tracing::debug!("Login rejected: unknown email");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS_MSG));
    };

    if !verify_password(&password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS_MSG));
    }

    let jwt = &state.config.jwt;
    let access_token = jwt.issue(user.id, &user.email)?;

    tracing::info!(user_id = user.id, "Logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: jwt.expires_in_secs(),
        user: UserResponse::from(&user),
    }))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, caller: AuthUser) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, caller.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: caller.user_id,
        })?;

    Ok(Json(UserResponse::from(&user)))
}
