//! Builder methods for creating errors with context

use super::types::Error;

impl Error {
    /// Create an invalid token error
    #[must_use]
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Error::InvalidToken {
            reason: reason.into(),
        }
    }

    /// Create a session invalid error
    #[must_use]
    pub fn session_invalid(session_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SessionInvalid {
            session_id: session_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a user not found error
    #[must_use]
    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Error::UserNotFound {
            user_id: user_id.into(),
        }
    }

    /// Create a user inactive error
    #[must_use]
    pub fn user_inactive(user_id: impl Into<String>) -> Self {
        Error::UserInactive {
            user_id: user_id.into(),
        }
    }

    /// Create an insufficient permissions error naming what was required
    #[must_use]
    pub fn insufficient_permissions(required: impl Into<String>) -> Self {
        Error::InsufficientPermissions {
            required: required.into(),
        }
    }

    /// Create a cohort membership error
    #[must_use]
    pub fn not_in_cohort(cohort: impl Into<String>, role: Option<String>) -> Self {
        Error::NotInCohort {
            cohort: cohort.into(),
            role,
        }
    }

    /// Create a store error
    #[must_use]
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Store {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a store error with a source error
    #[must_use]
    pub fn store_with_source(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Store {
            operation: operation.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}
