//! Credential verification.
//!
//! Credentials are HS256-signed JWTs. Verification is local: no store is
//! consulted here, the session check happens in the authenticator.

use cohortgate_config::AuthSettings;
use cohortgate_core::{Role, SessionId, UserId};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a verified credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: UserId,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Issued-at, epoch seconds
    #[serde(default)]
    pub iat: i64,
    /// Expiry, epoch seconds
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token rejected: {0}")]
    Invalid(String),
    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            JwtErrorKind::ExpiredSignature => TokenError::Expired,
            JwtErrorKind::InvalidToken
            | JwtErrorKind::Base64(_)
            | JwtErrorKind::Json(_)
            | JwtErrorKind::Utf8(_) => TokenError::Malformed(err.to_string()),
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

/// Verifies credential signatures and expiry
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = settings.leeway_secs;
        validation.validate_exp = true;
        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        if settings.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(settings.audience.as_slice());
        }

        Self {
            key: DecodingKey::from_secret(settings.jwt_secret.expose()),
            validation,
        }
    }

    /// Check signature, shape and expiry; never panics on arbitrary input
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Malformed("empty token".to_string()));
        }
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}
