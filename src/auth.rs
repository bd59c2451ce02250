use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use chrono::DateTime;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::{AuthConfig, Env},
    models::{Session, SessionUser},
};

/// Header accepted as a stand-in session in `Env::Local` only.
pub const LOCAL_BYPASS_HEADER: &str = "x-user-email";

/// Cookie names that may carry the session token, plain and `__Secure-` prefixed.
pub const SESSION_COOKIES: [&str; 2] = ["next-auth.session-token", "__Secure-next-auth.session-token"];

/// AuthError
///
/// The session service itself could not do its job. A token that is simply
/// invalid or expired is not an error; it resolves to no session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session secret is not configured")]
    MissingSecret,

    #[error("session token could not be verified: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// SessionResolver Trait
///
/// Given the inbound request headers and the trust anchor, return the current session,
/// `None` for an anonymous caller, or an error if resolution itself broke down.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(
        &self,
        headers: &HeaderMap,
        auth: &AuthConfig,
    ) -> Result<Option<Session>, AuthError>;
}

/// SessionState
///
/// The concrete type used to share the session resolver across the application state.
pub type SessionState = Arc<dyn SessionResolver>;

/// Claims
///
/// Payload of a signed session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Session {
            user: SessionUser {
                email: claims.email,
                name: claims.name,
            },
            expires: DateTime::from_timestamp(claims.exp as i64, 0),
        }
    }
}

/// JwtSessionResolver
///
/// Verifies HS256 session tokens taken from the `Authorization: Bearer` header or,
/// failing that, from the session cookie.
///
/// Resolution order:
/// 1. Local bypass: in `Env::Local`, a non-empty `x-user-email` header is trusted as-is.
/// 2. Token extraction: bearer header first, then cookie. No token means anonymous.
/// 3. Verification: signature and `exp` are checked against `AuthConfig::jwt_secret`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtSessionResolver;

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(
        &self,
        headers: &HeaderMap,
        auth: &AuthConfig,
    ) -> Result<Option<Session>, AuthError> {
        if auth.env == Env::Local {
            let bypass = headers
                .get(LOCAL_BYPASS_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|email| !email.is_empty());
            if let Some(email) = bypass {
                tracing::debug!(%email, "session resolved from local bypass header");
                return Ok(Some(Session::for_email(email)));
            }
        }

        let Some(token) = session_token(headers) else {
            return Ok(None);
        };

        if auth.jwt_secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let decoding_key = DecodingKey::from_secret(auth.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Tokens are issued for this service only; an `aud` claim is not an error.
        validation.validate_aud = false;

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => Ok(Some(data.claims.into())),
            Err(e) => match e.kind() {
                // The verifier itself is broken, whatever the caller sent.
                ErrorKind::InvalidKeyFormat
                | ErrorKind::InvalidEcdsaKey
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::RsaFailedSigning => Err(AuthError::Token(e)),
                // Anything else is a bad credential: treat as anonymous.
                _ => {
                    tracing::debug!(error = %e, "rejected session token");
                    Ok(None)
                }
            },
        }
    }
}

/// session_token
///
/// Finds the raw session token in the request headers, if any.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| SESSION_COOKIES.contains(name))
        .map(|(_, value)| value)
}
