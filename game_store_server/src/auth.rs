//! Access token verification.
//!
//! Tokens are minted by the external auth service and signed with a shared HS256 secret. This server never issues
//! them; it checks the signature and expiry, and hands the claims to the route handlers.
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use game_store_engine::db_types::Role;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id.
    pub sub: String,
    pub role: Role,
    /// Expiry, as a unix timestamp in seconds.
    pub exp: usize,
}

impl JwtClaims {
    /// Admins can do everything users can.
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role || self.role == Role::Admin
    }
}

/// Pulls the claims the JWT middleware attached to the request. Handlers that take a `JwtClaims` argument must sit
/// behind that middleware.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            warn!("🔐️ No JWT claims found in request extensions for {}", req.path());
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        trace!("🔐️ Access token verified for {} ({})", data.claims.sub, data.claims.role);
        Ok(data.claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::PoorlyFormattedToken(format!("Unsupported authorization scheme: {scheme}")));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
