//! Session tokens.
//!
//! Sessions are stateless: login hands out an HS256-signed JWT and every
//! authenticated request re-validates it. Nothing is stored server-side, so
//! a token stays valid until `exp`.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use scout_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_EXPIRY_HOURS: i64 = 720;

/// Payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    /// Email the user logged in with.
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    /// Random per-token id, useful when correlating logs.
    pub jti: String,
}

/// Signing secret and session lifetime.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

impl JwtConfig {
    /// | Env Var            | Required | Default |
    /// |--------------------|----------|---------|
    /// | `JWT_SECRET`       | **yes**  | --      |
    /// | `JWT_EXPIRY_HOURS` | no       | `720`   |
    ///
    /// # Panics
    ///
    /// If `JWT_SECRET` is missing or blank, or `JWT_EXPIRY_HOURS` is not an
    /// integer. Both are startup misconfigurations.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.trim().is_empty(), "JWT_SECRET must be set");

        let expiry_hours = match std::env::var("JWT_EXPIRY_HOURS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .unwrap_or_else(|_| panic!("JWT_EXPIRY_HOURS must be an integer, got '{raw}'")),
            Err(_) => DEFAULT_EXPIRY_HOURS,
        };

        Self {
            secret,
            expiry_hours,
        }
    }

    /// Session lifetime in seconds (reported to clients as `expires_in`).
    pub fn expires_in_secs(&self) -> i64 {
        self.expiry_hours * 3600
    }

    /// Sign a new session token for `user_id`.
    pub fn issue(&self, user_id: DbId, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            exp: iat + self.expires_in_secs(),
            iat,
            jti: Uuid::new_v4().to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Check signature and expiry and return the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}
