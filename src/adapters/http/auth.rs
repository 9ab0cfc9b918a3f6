//! JWT authentication extractors.
//!
//! Tokens are issued by the external auth service and HMAC-signed with a
//! shared secret. The core only consumes `{user_id, role}`; verification
//! of anything beyond signature and expiry is the auth service's problem.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::domain::foundation::{UserId, UserRole};

use super::error::ErrorResponse;
use super::BillingAppState;

/// Claims carried by an access token.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub user_id: UserId,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Decodes and validates bearer tokens.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, algorithm: Algorithm) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(algorithm),
        }
    }

    /// Decode a token into its claims.
    pub fn decode(&self, token: &str) -> Result<AccessTokenClaims, AuthRejection> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
                .map_err(|err| match err.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AuthRejection::ExpiredToken
                    }
                    _ => AuthRejection::InvalidToken,
                })?;
        Ok(data.claims)
    }
}

/// Authenticated caller extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Authenticated caller that must hold the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

/// Why authentication failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    NotAdmin,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AuthRejection::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Bearer token required")
            }
            AuthRejection::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Invalid access token")
            }
            AuthRejection::ExpiredToken => {
                (StatusCode::UNAUTHORIZED, "Access token is expired")
            }
            AuthRejection::NotAdmin => (
                StatusCode::FORBIDDEN,
                "Operation allowed only for admin users",
            ),
        };
        (status, Json(ErrorResponse::new(detail))).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthRejection> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthRejection::MissingToken)
}

#[axum::async_trait]
impl FromRequestParts<BillingAppState> for AuthenticatedUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &BillingAppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.jwt.decode(token)?;
        Ok(AuthenticatedUser {
            user_id: claims.user_id,
            role: claims.role,
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<BillingAppState> for AdminUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &BillingAppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthRejection::NotAdmin);
        }
        Ok(AdminUser(user))
    }
}
