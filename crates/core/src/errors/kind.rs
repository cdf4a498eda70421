//! The closed failure taxonomy every error collapses into at the edge

use super::types::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure kinds surfaced to callers, one per row of the status table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MissingToken,
    InvalidToken,
    SessionInvalid,
    UserNotFound,
    UserInactive,
    InsufficientPermissions,
    NotInCohort,
    RateLimited,
    AuthError,
}

impl ErrorKind {
    /// HTTP status code for this kind
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::MissingToken
            | ErrorKind::InvalidToken
            | ErrorKind::SessionInvalid
            | ErrorKind::UserNotFound => 401,
            ErrorKind::UserInactive
            | ErrorKind::InsufficientPermissions
            | ErrorKind::NotInCohort => 403,
            ErrorKind::RateLimited => 429,
            ErrorKind::AuthError => 500,
        }
    }

    /// Wire code, e.g. `MISSING_TOKEN`
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::MissingToken => "MISSING_TOKEN",
            ErrorKind::InvalidToken => "INVALID_TOKEN",
            ErrorKind::SessionInvalid => "SESSION_INVALID",
            ErrorKind::UserNotFound => "USER_NOT_FOUND",
            ErrorKind::UserInactive => "USER_INACTIVE",
            ErrorKind::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            ErrorKind::NotInCohort => "NOT_IN_COHORT",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::AuthError => "AUTH_ERROR",
        }
    }

    /// Fixed message used when nothing more specific is safe to say
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::MissingToken => "Authorization token required",
            ErrorKind::InvalidToken => "Invalid or expired token",
            ErrorKind::SessionInvalid => "Session is no longer valid",
            ErrorKind::UserNotFound => "User account not found",
            ErrorKind::UserInactive => "User account is deactivated",
            ErrorKind::InsufficientPermissions => "Insufficient permissions for this action",
            ErrorKind::NotInCohort => "You are not a member of this cohort",
            ErrorKind::RateLimited => "Too many requests",
            ErrorKind::AuthError => "Authentication failed",
        }
    }

    /// Whether this kind is caused by the server rather than the caller
    #[must_use]
    pub fn is_internal(self) -> bool {
        matches!(self, ErrorKind::AuthError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Error {
    /// Collapse this error into its caller-facing kind
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingToken => ErrorKind::MissingToken,
            Error::InvalidToken { .. } => ErrorKind::InvalidToken,
            Error::SessionInvalid { .. } => ErrorKind::SessionInvalid,
            Error::UserNotFound { .. } => ErrorKind::UserNotFound,
            Error::UserInactive { .. } => ErrorKind::UserInactive,
            Error::InsufficientPermissions { .. } => ErrorKind::InsufficientPermissions,
            Error::NotInCohort { .. } => ErrorKind::NotInCohort,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::Store { .. } | Error::Configuration { .. } | Error::Internal { .. } => {
                ErrorKind::AuthError
            }
        }
    }

    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> u16 {
        self.kind().status()
    }

    /// Message that is safe to return to the caller.
    ///
    /// Internal variants never include their detail here.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Error::InsufficientPermissions { required } => {
                format!("This action requires {required}")
            }
            Error::NotInCohort { cohort, role } => match role {
                Some(role) => format!("You are not a {role} of cohort {cohort}"),
                None => format!("You are not a member of cohort {cohort}"),
            },
            Error::RateLimited {
                retry_after_secs, ..
            } => format!("Too many requests. Try again in {retry_after_secs} seconds."),
            other => other.kind().default_message().to_string(),
        }
    }
}
