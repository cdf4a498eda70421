//! Audit log entries

use super::identity::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Privileged actions worth a permanent record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UserCreated,
    UserUpdated,
    UserBanned,
    UserUnbanned,
    RoleAssigned,
    RoleRevoked,
    LoginSuccess,
    OtpRequested,
    OtpFailed,
    SessionCreated,
    SessionRevoked,
    ApplicationCreated,
    ApplicationUpdated,
    ApplicationReviewed,
    ApplicationStatusChanged,
    ApplicationWithdrawn,
    ArticlePublished,
    ArticleRejected,
    EmailSent,
    AdminExportedData,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // serde already knows the wire name
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(name)) => f.write_str(&name),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// Who performed an audited action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditActor {
    pub user_id: Option<UserId>,
    pub is_admin: bool,
}

/// Append-only record of a privileged action; written once, never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub actor_user_id: Option<UserId>,
    pub actor_is_admin: bool,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Start an entry for `action` on the given entity, timestamped now
    pub fn new(
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            action,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            actor_user_id: None,
            actor_is_admin: false,
            ip_address: crate::constants::UNKNOWN_CLIENT.to_string(),
            user_agent: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn actor(mut self, actor: AuditActor) -> Self {
        self.actor_user_id = actor.user_id;
        self.actor_is_admin = actor.is_admin;
        self
    }

    #[must_use]
    pub fn client(mut self, ip_address: impl Into<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address.into();
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
