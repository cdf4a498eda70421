//! Identity types: users, sessions and the per-request principal

use super::roles::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::Deref;

/// Identifier of a user account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new user id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for UserId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a login session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A user account as stored by the identity subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// Account-level role; scoped roles live in role assignments
    #[serde(default)]
    pub role: Role,
    pub is_active: bool,
}

/// Identity resolved from a verified credential, scoped to one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
        }
    }
}

/// A login session owned by the external session store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub is_valid: bool,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Why this session cannot be used at `now`, or `None` if it is live
    #[must_use]
    pub fn rejection_at(&self, now: DateTime<Utc>) -> Option<&'static str> {
        if !self.is_valid {
            Some("session revoked")
        } else if self.expires_at <= now {
            Some("session expired")
        } else {
            None
        }
    }

    /// Whether the session can back a request at `now`
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.rejection_at(now).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(is_valid: bool, expires_in_secs: i64, now: DateTime<Utc>) -> Session {
        Session {
            id: SessionId::new("s-1"),
            user_id: UserId::new("u-1"),
            is_valid,
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    #[test]
    fn test_session_liveness() {
        let now = Utc::now();
        assert!(session(true, 60, now).is_live_at(now));
        assert_eq!(
            session(false, 60, now).rejection_at(now),
            Some("session revoked")
        );
        assert_eq!(
            session(true, -1, now).rejection_at(now),
            Some("session expired")
        );
        // expiry instant itself is no longer valid
        assert!(!session(true, 0, now).is_live_at(now));
    }

    #[test]
    fn test_user_deserializes_with_default_role() {
        let user: User =
            serde_json::from_str(r#"{"id":"u-1","email":"a@b.org","isActive":true}"#).unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.id.as_str(), "u-1");
    }
}
