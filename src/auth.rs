//! Identity gate: resolves bearer credentials to a user identity.
//!
//! Task handlers never see a request whose caller is unknown; the [`Caller`]
//! extractor rejects it with 401 first.

use crate::error::ServiceError;
use crate::types::UserId;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No token, authorization denied")]
    MissingToken,
    #[error("Token is not valid")]
    InvalidToken,
}

/// Failure to mint a token.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("token lifetime is out of range")]
    LifetimeOutOfRange,
    #[error(transparent)]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
}

/// Resolves a bearer token to an identity.
pub trait IdentityGate: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Identity, AuthError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HS256 JSON Web Token gate.
pub struct JwtGate {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
}

impl JwtGate {
    pub fn new(secret: &str, issuer: Option<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Mint a token for `user` valid for `ttl`.
    pub fn issue(&self, user: &UserId, ttl: Duration) -> Result<String, IssueError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or(IssueError::LifetimeOutOfRange)?;
        let claims = Claims {
            sub: user.as_str().to_string(),
            exp: expires.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Mint a token valid for `hours`, as configured or given on the command line.
    pub fn issue_for_hours(&self, user: &UserId, hours: i64) -> Result<String, IssueError> {
        let ttl = Duration::try_hours(hours).ok_or(IssueError::LifetimeOutOfRange)?;
        self.issue(user, ttl)
    }
}

impl IdentityGate for JwtGate {
    fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|err| {
            warn!(error = %err, "Token validation failed");
            AuthError::InvalidToken
        })?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(Identity {
            id: UserId::new(data.claims.sub),
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthError::InvalidToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// The resolved caller of a request.
#[derive(Debug, Clone)]
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    Arc<dyn IdentityGate>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = <Arc<dyn IdentityGate> as FromRef<S>>::from_ref(state);
        let token = bearer_token(&parts.headers).inspect_err(|err| {
            debug!(path = %parts.uri.path(), reason = %err, "Rejected unauthenticated request");
        })?;
        let identity = gate.resolve(token)?;
        Ok(Caller(identity.id))
    }
}
