//! Bearer-token authentication
//!
//! Access tokens are HS256-signed JWTs whose subject is the caller's [UserId].

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, TimeDelta, Utc};
use crewboard_shared::error::CrewboardError;
use crewboard_shared::UserId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::WebError;
use crate::SharedState;

/// Claims carried by every access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry: TimeDelta,
}

impl JwtConfig {
    pub fn new(secret: String, expiry_mins: i64) -> Result<Self, CrewboardError> {
        if secret.is_empty() {
            return Err(CrewboardError::Configuration(
                "JWT secret must not be empty".to_string(),
            ));
        }
        if expiry_mins <= 0 {
            return Err(CrewboardError::Configuration(format!(
                "JWT expiry must be positive, got {expiry_mins} minutes"
            )));
        }
        Ok(Self {
            secret,
            expiry: TimeDelta::minutes(expiry_mins),
        })
    }

    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            expiry: TimeDelta::minutes(15),
        }
    }
}

pub fn issue_token(
    user: UserId,
    config: &JwtConfig,
    now: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user.as_uuid(),
        exp: (now + config.expiry).timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Checks the signature and expiry of a token, returning its claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// The authenticated caller, resolved from the `Authorization: Bearer` header.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                CrewboardError::Unauthorized("Missing Authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            CrewboardError::Unauthorized(
                "Invalid Authorization format, expected: Bearer <token>".to_string(),
            )
        })?;

        let config = state.read().await.jwt.clone();
        let claims = validate_token(token, &config).map_err(|err| {
            debug!(error = ?err, "Rejected access token");
            CrewboardError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(AuthUser {
            user_id: UserId(claims.sub),
        })
    }
}
