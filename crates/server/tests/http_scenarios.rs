//! End-to-end scenarios driven through the full router in-process.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use cohortgate_config::{Config, Environment, JwtSecret, UnidentifiedClientPolicy, WindowSettings};
use cohortgate_core::{
    AuditAction, CohortMembership, CohortRole, MemoryStore, Role, RoleAssignment, Session,
    SessionId, User, UserId,
};
use cohortgate_security::{AuditLogger, Claims};
use cohortgate_server::{router, AppState};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "integration-secret-integration-secret";

fn config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = JwtSecret::new(SECRET);
    config.rate_limit.auth = WindowSettings::new(5, 60_000);
    config
}

fn token(user: &str, session: &str) -> String {
    token_expiring(user, session, 3600)
}

fn token_expiring(user: &str, session: &str, expires_in: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        user_id: UserId::new(user),
        session_id: SessionId::new(session),
        email: None,
        role: None,
        iat: now - 7200,
        exp: now + expires_in,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn add_user(store: &MemoryStore, id: &str, role: Role, session_ttl: Duration) {
    store.insert_user(User {
        id: UserId::new(id),
        email: format!("{id}@robotics.team"),
        role,
        is_active: true,
    });
    store.insert_session(Session {
        id: SessionId::new(format!("s-{id}")),
        user_id: UserId::new(id),
        is_valid: true,
        expires_at: Utc::now() + session_ttl,
    });
}

fn assign(store: &MemoryStore, id: &str, role: Role, cohort: Option<&str>) {
    store.insert_assignment(RoleAssignment {
        user_id: UserId::new(id),
        role,
        cohort: cohort.map(str::to_string),
        is_active: true,
        start_date: Utc::now() - Duration::days(60),
        end_date: None,
    });
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    add_user(&store, "admin", Role::Admin, Duration::hours(1));
    assign(&store, "admin", Role::Admin, None);

    add_user(&store, "student", Role::Student, Duration::hours(1));
    assign(&store, "student", Role::Student, Some("2025"));

    add_user(&store, "multi", Role::Student, Duration::hours(1));
    assign(&store, "multi", Role::Student, Some("A"));
    assign(&store, "multi", Role::Mentor, Some("B"));
    store.insert_membership(CohortMembership {
        user_id: UserId::new("multi"),
        cohort: "A".into(),
        role: CohortRole::Student,
        is_active: true,
    });

    add_user(&store, "late", Role::Admin, Duration::seconds(-1));
    assign(&store, "late", Role::Admin, None);
    Arc::new(store)
}

fn app_with(config: Config) -> (Router, Arc<MemoryStore>) {
    let store = seeded_store();
    let state = AppState::new(config, store.clone());
    (router(state), store)
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        let bearer = format!("Bearer {}", token(user, &format!("s-{user}")));
        builder = builder.header("authorization", bearer);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token(user, &format!("s-{user}"))))
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap()
}

async fn json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn admin_reaches_admin_route() {
    let (app, _) = app_with(config());
    let response = send(&app, get("/api/admin/overview", Some("admin"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["effectiveRole"]["role"], "ADMIN");
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let (app, _) = app_with(config());
    let response = send(&app, get("/api/auth/session", Some("late"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "SESSION_INVALID");
}

#[tokio::test]
async fn student_is_forbidden_from_admin_route() {
    let (app, _) = app_with(config());
    let response = send(&app, get("/api/admin/overview", Some("student"))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json(response).await;
    assert_eq!(body["error"]["code"], "INSUFFICIENT_PERMISSIONS");
}

#[tokio::test]
async fn sixth_auth_request_is_rate_limited() {
    let (app, _) = app_with(config());
    let request = || {
        let mut request = get("/api/auth/session", Some("admin"));
        request
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.50".parse().unwrap());
        request
    };

    for attempt in 1..=5 {
        let response = send(&app, request()).await;
        assert_eq!(response.status(), StatusCode::OK, "attempt {attempt}");
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");
        assert_eq!(
            response.headers()["x-ratelimit-remaining"],
            (5 - attempt).to_string().as_str()
        );
    }

    let response = send(&app, request()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry), "retry-after {retry}");
    assert!(response.headers().contains_key("x-ratelimit-reset"));
    let body = json(response).await;
    assert_eq!(body["error"]["code"], "RATE_LIMITED");

    // a different client still has its own budget
    let mut other = get("/api/auth/session", Some("admin"));
    other
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.60".parse().unwrap());
    assert_eq!(send(&app, other).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_and_garbage_tokens() {
    let (app, _) = app_with(config());
    let body = json(send(&app, get("/api/me/cohorts", None)).await).await;
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");

    let request = Request::builder()
        .uri("/api/me/cohorts")
        .header("authorization", "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn expired_token_is_invalid_even_with_live_session() {
    let (app, _) = app_with(config());
    let request = Request::builder()
        .uri("/api/auth/session")
        .header(
            "authorization",
            format!("Bearer {}", token_expiring("admin", "s-admin", -60)),
        )
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn cookie_credential_is_accepted() {
    let (app, _) = app_with(config());
    let request = Request::builder()
        .uri("/api/me/cohorts")
        .header("cookie", format!("auth_token={}", token("student", "s-student")))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn mentor_route_checks_every_assignment() {
    let (app, _) = app_with(config());
    let allowed = send(&app, get("/api/mentor/cohorts/B", Some("multi"))).await;
    assert_eq!(allowed.status(), StatusCode::OK);

    let denied = send(&app, get("/api/mentor/cohorts/A", Some("multi"))).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cohort_route_uses_membership_records() {
    let (app, _) = app_with(config());
    assert_eq!(
        send(&app, get("/api/cohorts/A", Some("multi"))).await.status(),
        StatusCode::OK
    );
    let response = send(&app, get("/api/cohorts/B", Some("multi"))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json(response).await["error"]["code"], "NOT_IN_COHORT");
}

#[tokio::test]
async fn analytics_requires_permission() {
    let (app, _) = app_with(config());
    assert_eq!(
        send(&app, get("/api/admin/analytics", Some("admin"))).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        send(&app, get("/api/admin/analytics", Some("multi"))).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let (app, _) = app_with(config());
    let response = send(&app, post("/api/auth/logout", "student")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/api/auth/session", Some("student"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["error"]["code"], "SESSION_INVALID");
}

#[tokio::test]
async fn admin_revocation_is_audited() {
    let (app, store) = app_with(config());
    let response = send(&app, post("/api/admin/users/student/sessions/revoke", "admin")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["data"]["revoked"], 1);

    let mut entries = Vec::new();
    for _ in 0..50 {
        entries = store.audit_entries();
        if !entries.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::SessionRevoked);
    assert_eq!(entries[0].entity_id, "student");
    assert_eq!(entries[0].actor_user_id, Some(UserId::new("admin")));
    assert!(entries[0].actor_is_admin);

    let response = send(&app, get("/api/me/cohorts", Some("student"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn audit_outage_does_not_fail_the_request() {
    let store = seeded_store();
    let mut state = AppState::new(config(), store);
    let audit_store = Arc::new(MemoryStore::new());
    audit_store.set_unavailable(true);
    state.audit = Arc::new(AuditLogger::spawn(audit_store, &state.config.audit));
    let audit = state.audit.clone();
    let app = router(state);

    let response = send(&app, post("/api/auth/logout", "multi")).await;
    assert_eq!(response.status(), StatusCode::OK);

    for _ in 0..50 {
        if audit.stats().failed > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(audit.stats().failed, 1);
    assert_eq!(audit.stats().written, 0);
}

#[tokio::test]
async fn store_outage_is_a_generic_500() {
    let (app, store) = app_with(config());
    store.set_unavailable(true);
    let response = send(&app, get("/api/me/cohorts", Some("admin"))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_ERROR");
    assert_eq!(body["error"]["message"], "Authentication failed");
}

#[tokio::test]
async fn security_headers_everywhere() {
    let (app, _) = app_with(config());
    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(!headers.contains_key("strict-transport-security"));

    let denied = send(&app, get("/api/admin/overview", Some("student"))).await;
    assert_eq!(denied.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn hsts_only_in_production() {
    let mut config = config();
    config.server.environment = Environment::Production;
    let (app, _) = app_with(config);
    let response = send(&app, get("/health", None)).await;
    assert!(response.headers().contains_key("strict-transport-security"));
}

#[tokio::test]
async fn preflight_short_circuits() {
    let (app, _) = app_with(config());
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/admin/overview")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn request_constraints_run_before_auth() {
    let (app, _) = app_with(config());
    let wrong_type = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header("content-type", "text/plain")
        .body(Body::from("hi"))
        .unwrap();
    let response = send(&app, wrong_type).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"]["code"], "INVALID_CONTENT_TYPE");

    let oversized = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header("content-type", "application/json")
        .header("content-length", "2097152")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, oversized).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json(response).await["error"]["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn unidentified_clients_can_be_rejected() {
    let mut config = config();
    config.rate_limit.unidentified_clients = UnidentifiedClientPolicy::Reject;
    let (app, _) = app_with(config);

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"]["code"], "UNIDENTIFIED_CLIENT");

    let mut identified = get("/health", None);
    identified
        .headers_mut()
        .insert("x-real-ip", "198.51.100.77".parse().unwrap());
    assert_eq!(send(&app, identified).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn csrf_double_submit() {
    let mut config = config();
    config.csrf.enabled = true;
    let (app, _) = app_with(config);

    let issued = send(&app, get("/api/me/cohorts", Some("student"))).await;
    let set_cookie = issued.headers()["set-cookie"].to_str().unwrap().to_string();
    let token = set_cookie
        .trim_start_matches("csrf_token=")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = send(&app, post("/api/auth/logout", "student")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json(response).await["error"]["code"], "CSRF_TOKEN_INVALID");

    let mut request = post("/api/auth/logout", "student");
    request
        .headers_mut()
        .insert("cookie", format!("csrf_token={token}").parse().unwrap());
    request
        .headers_mut()
        .insert("x-csrf-token", token.parse().unwrap());
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
}
