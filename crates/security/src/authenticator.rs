//! Turns an inbound credential into a verified principal.

use crate::token::{TokenError, TokenVerifier};
use chrono::{DateTime, Utc};
use cohortgate_config::AuthSettings;
use cohortgate_core::{
    Error, Principal, Result, SessionId, SessionStore, UserStore, BEARER_SCHEME, UNKNOWN_CLIENT,
};
use std::net::IpAddr;
use std::sync::Arc;

/// The transport-level facts about a request that authentication and rate
/// limiting need, independent of any HTTP framework
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub authorization: Option<String>,
    /// Raw `Cookie` header
    pub cookies: Option<String>,
    pub forwarded_for: Option<String>,
    pub real_ip: Option<String>,
    pub user_agent: Option<String>,
    /// Address of the TCP peer, when the transport knows it
    pub peer: Option<IpAddr>,
}

impl RequestMeta {
    /// Value of the named cookie, if present and non-empty
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.as_deref()?.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name && !value.trim().is_empty()).then(|| value.trim())
        })
    }

    /// Credential from the bearer header, falling back to the cookie.
    /// The scheme name matches case-insensitively.
    pub fn credential(&self, cookie_name: &str) -> Option<&str> {
        let from_header = self
            .authorization
            .as_deref()
            .and_then(|value| value.trim_start().split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(BEARER_SCHEME))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty());
        from_header.or_else(|| self.cookie(cookie_name))
    }

    /// Client address announced by a proxy: first `X-Forwarded-For` hop,
    /// else `X-Real-IP`
    pub fn forwarded_client(&self) -> Option<&str> {
        let first_hop = self
            .forwarded_for
            .as_deref()
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());
        first_hop.or_else(|| {
            self.real_ip
                .as_deref()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
    }

    /// Address recorded in audit entries
    pub fn audit_ip(&self) -> String {
        self.forwarded_client().unwrap_or(UNKNOWN_CLIENT).to_string()
    }
}

/// Outcome of a successful authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub principal: Principal,
    pub session_id: SessionId,
}

pub struct RequestAuthenticator {
    verifier: TokenVerifier,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    cookie_name: String,
}

impl RequestAuthenticator {
    pub fn new(
        settings: &AuthSettings,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            verifier: TokenVerifier::new(settings),
            sessions,
            users,
            cookie_name: settings.cookie_name.clone(),
        }
    }

    pub async fn authenticate(&self, meta: &RequestMeta) -> Result<Authenticated> {
        self.authenticate_at(meta, Utc::now()).await
    }

    /// Authenticate against session state as of `now`.
    ///
    /// The session store is consulted on every call; it is the only
    /// revocation path for otherwise valid credentials.
    pub async fn authenticate_at(
        &self,
        meta: &RequestMeta,
        now: DateTime<Utc>,
    ) -> Result<Authenticated> {
        let result = self.run(meta, now).await;
        if let Err(err) = &result {
            if err.kind().is_internal() {
                tracing::error!(error = %err, "authentication failed on internal error");
            } else {
                tracing::warn!(code = err.kind().code(), reason = %err, "authentication rejected");
            }
        }
        result
    }

    async fn run(&self, meta: &RequestMeta, now: DateTime<Utc>) -> Result<Authenticated> {
        let token = meta
            .credential(&self.cookie_name)
            .ok_or(Error::MissingToken)?;

        let claims = self.verifier.verify(token).map_err(|err| {
            tracing::debug!(reason = %err, "credential verification failed");
            match err {
                TokenError::Expired => Error::invalid_token("token expired"),
                TokenError::Malformed(_) => Error::invalid_token("malformed token"),
                TokenError::Invalid(_) => Error::invalid_token("signature or claims rejected"),
            }
        })?;

        let session = self
            .sessions
            .find_session(&claims.session_id)
            .await?
            .ok_or_else(|| {
                Error::session_invalid(claims.session_id.as_str(), "session not found")
            })?;
        if let Some(reason) = session.rejection_at(now) {
            return Err(Error::session_invalid(session.id.as_str(), reason));
        }
        if session.user_id != claims.user_id {
            return Err(Error::session_invalid(
                session.id.as_str(),
                format!("session belongs to {}", session.user_id),
            ));
        }

        let user = self
            .users
            .find_user(&claims.user_id)
            .await?
            .ok_or_else(|| Error::user_not_found(claims.user_id.as_str()))?;
        if !user.is_active {
            return Err(Error::user_inactive(user.id.as_str()));
        }

        tracing::debug!(user_id = %user.id, session_id = %session.id, "request authenticated");
        Ok(Authenticated {
            principal: Principal::from(user),
            session_id: session.id,
        })
    }
}
