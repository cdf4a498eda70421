//! Failure and success response shapes.
//!
//! Every failure renders as `{"success": false, "error": {"code", "message"}}`.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cohortgate_core::{
    Error, RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER,
    RETRY_AFTER_HEADER,
};
use serde::Serialize;
use serde_json::{json, Value};

pub fn failure(status: StatusCode, code: &str, message: &str) -> Response {
    let body = json!({
        "success": false,
        "error": { "code": code, "message": message },
    });
    (status, Json(body)).into_response()
}

pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// An authorization core error on its way out to the client
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        if kind.is_internal() {
            tracing::error!(error = %self.0, "request failed on internal error");
        }

        let status =
            StatusCode::from_u16(kind.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = failure(status, kind.code(), &self.0.public_message());

        if let Error::RateLimited {
            limit,
            reset_at_epoch_secs,
            retry_after_secs,
            ..
        } = &self.0
        {
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static(RATE_LIMIT_LIMIT_HEADER),
                HeaderValue::from(*limit),
            );
            headers.insert(
                HeaderName::from_static(RATE_LIMIT_REMAINING_HEADER),
                HeaderValue::from(0u32),
            );
            headers.insert(
                HeaderName::from_static(RATE_LIMIT_RESET_HEADER),
                HeaderValue::from(*reset_at_epoch_secs),
            );
            headers.insert(
                HeaderName::from_static(RETRY_AFTER_HEADER),
                HeaderValue::from(*retry_after_secs),
            );
        }
        response
    }
}

/// Rejections raised by request middleware before the authorization core runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestRejection {
    InvalidContentType,
    PayloadTooLarge { limit: usize },
    UnidentifiedClient,
    CsrfTokenInvalid,
}

impl RequestRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestRejection::InvalidContentType | RequestRejection::UnidentifiedClient => {
                StatusCode::BAD_REQUEST
            }
            RequestRejection::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RequestRejection::CsrfTokenInvalid => StatusCode::FORBIDDEN,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RequestRejection::InvalidContentType => "INVALID_CONTENT_TYPE",
            RequestRejection::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            RequestRejection::UnidentifiedClient => "UNIDENTIFIED_CLIENT",
            RequestRejection::CsrfTokenInvalid => "CSRF_TOKEN_INVALID",
        }
    }

    pub fn message(&self) -> String {
        match self {
            RequestRejection::InvalidContentType => {
                "Content-Type must be application/json".to_string()
            }
            RequestRejection::PayloadTooLarge { limit } => {
                format!("Request payload too large (max {limit} bytes)")
            }
            RequestRejection::UnidentifiedClient => {
                "Client address could not be determined".to_string()
            }
            RequestRejection::CsrfTokenInvalid => "Invalid or missing CSRF token".to_string(),
        }
    }
}

impl IntoResponse for RequestRejection {
    fn into_response(self) -> Response {
        failure(self.status(), self.code(), &self.message())
    }
}
