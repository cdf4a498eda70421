//! Request middleware, outermost first: request log, hardening headers,
//! request constraints, rate limiting, CSRF.

use crate::extract::{peer_address, request_meta};
use crate::response::{ApiError, RequestRejection};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cohortgate_core::{
    RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER,
    SLOW_REQUEST_MILLIS, UNKNOWN_CLIENT, USER_AGENT_LOG_LIMIT,
};
use cohortgate_security::{csrf, ClientIdentity, LimitClass, RateLimitOutcome};
use std::time::Instant;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: https:; \
    font-src 'self' https://fonts.googleapis.com https://fonts.gstatic.com; \
    connect-src 'self' https://fonts.googleapis.com https://fonts.gstatic.com; \
    frame-src 'none'; \
    object-src 'none';";

const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Log every request with its outcome and latency
pub async fn request_log(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let meta = request_meta(request.headers(), request.extensions());
    let client = meta
        .forwarded_client()
        .map(str::to_string)
        .or_else(|| meta.peer.map(|ip| ip.to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    let user_agent: String = meta
        .user_agent
        .as_deref()
        .unwrap_or(UNKNOWN_CLIENT)
        .chars()
        .take(USER_AGENT_LOG_LIMIT)
        .collect();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = started.elapsed().as_millis();
    let duration_ms = u64::try_from(elapsed).unwrap_or(u64::MAX);
    if status >= 500 {
        tracing::error!(%method, %path, status, duration_ms, %client, %user_agent, "request failed");
    } else if status >= 400 || elapsed > SLOW_REQUEST_MILLIS {
        tracing::warn!(%method, %path, status, duration_ms, %client, %user_agent, "request");
    } else {
        tracing::info!(%method, %path, status, duration_ms, %client, %user_agent, "request");
    }
    response
}

/// CORS and hardening headers on every response; preflights end here
pub async fn security_headers(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    apply_security_headers(response.headers_mut(), &state);
    response
}

fn apply_security_headers(headers: &mut HeaderMap, state: &AppState) {
    let origins = HeaderValue::from_str(&state.config.server.allowed_origins)
        .unwrap_or_else(|_| HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origins);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    let allow_headers = format!("Content-Type, Authorization, {}", state.config.csrf.header_name);
    if let Ok(value) = HeaderValue::from_str(&allow_headers) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    if state.config.is_production() {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS),
        );
    }
}

/// JSON-only bodies for POST/PUT and a payload cap, checked before any auth
pub async fn request_constraints(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method();
    if method == Method::POST || method == Method::PUT {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        if let Some(content_type) = content_type {
            if !content_type.to_ascii_lowercase().contains("application/json") {
                return RequestRejection::InvalidContentType.into_response();
            }
        }
    }

    let limit = state.config.server.max_body_bytes;
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    if declared.is_some_and(|length| length > limit as u64) {
        return RequestRejection::PayloadTooLarge { limit }.into_response();
    }

    next.run(request).await
}

/// Route class for a path, besides the global budget every request counts against
pub fn route_class(path: &str) -> Option<LimitClass> {
    if path == "/api/auth" || path.starts_with("/api/auth/") {
        Some(LimitClass::Auth)
    } else if path.starts_with("/api/") {
        Some(LimitClass::Api)
    } else {
        None
    }
}

/// Count the request against the global budget and its route class
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let meta = request_meta(request.headers(), request.extensions());
    let Some(client) = ClientIdentity::resolve(&meta, state.limiter.policy()) else {
        tracing::warn!(path = request.uri().path(), "request without client identity rejected");
        return RequestRejection::UnidentifiedClient.into_response();
    };

    let global = state.limiter.check(LimitClass::Global, &client);
    if !global.allowed {
        return ApiError(global.to_error()).into_response();
    }

    let outcome = match route_class(request.uri().path()) {
        Some(class) => {
            let outcome = state.limiter.check(class, &client);
            if !outcome.allowed {
                return ApiError(outcome.to_error()).into_response();
            }
            outcome
        }
        None => global,
    };

    let mut response = next.run(request).await;
    apply_rate_limit_headers(response.headers_mut(), &outcome);
    response
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, outcome: &RateLimitOutcome) {
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_LIMIT_HEADER),
        HeaderValue::from(outcome.limit),
    );
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_REMAINING_HEADER),
        HeaderValue::from(outcome.remaining),
    );
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_RESET_HEADER),
        HeaderValue::from(outcome.reset_epoch_secs()),
    );
}

/// Double-submit check for state-changing requests; safe requests without a
/// token cookie get one issued
pub async fn csrf_protection(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let settings = &state.config.csrf;
    if !settings.enabled {
        return next.run(request).await;
    }

    let path = request.uri().path();
    if settings.excluded_paths.iter().any(|excluded| excluded == path) {
        return next.run(request).await;
    }

    let meta = request_meta(request.headers(), request.extensions());
    let cookie = meta.cookie(&settings.cookie_name).map(str::to_string);

    if csrf::requires_check(request.method().as_str()) {
        let header = request
            .headers()
            .get(settings.header_name.as_str())
            .and_then(|value| value.to_str().ok());
        if !csrf::verify(header, cookie.as_deref()) {
            tracing::warn!(
                path,
                client = ?peer_address(request.extensions()),
                "csrf token mismatch"
            );
            return RequestRejection::CsrfTokenInvalid.into_response();
        }
        return next.run(request).await;
    }

    let mut response = next.run(request).await;
    if cookie.is_none() {
        let set_cookie = format!(
            "{}={}; Path=/; SameSite=Strict",
            settings.cookie_name,
            csrf::generate_token()
        );
        if let Ok(value) = HeaderValue::from_str(&set_cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
