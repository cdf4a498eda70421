use crate::extract::ClientMeta;
use crate::middleware;
use crate::response::{success, ApiError};
use crate::state::AppState;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use cohortgate_core::{AuditAction, Permission, Role, UserId};
use cohortgate_security::actor_for;
use serde_json::{json, Value};

type ApiResult = Result<Json<Value>, ApiError>;

const ADMINS: [Role; 2] = [Role::Admin, Role::SuperAdmin];

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/session", get(current_session))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/admin/overview", get(admin_overview))
        .route("/api/admin/analytics", get(admin_analytics))
        .route(
            "/api/admin/users/:user_id/sessions/revoke",
            post(revoke_user_sessions),
        )
        .route("/api/cohorts/:cohort", get(cohort_home))
        .route("/api/mentor/cohorts/:cohort", get(mentor_cohort))
        .route("/api/me/cohorts", get(my_cohorts))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::csrf_protection,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_constraints,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::security_headers,
        ))
        .layer(axum::middleware::from_fn(middleware::request_log))
        .with_state(state)
}

async fn health() -> Json<Value> {
    success(json!({ "status": "ok" }))
}

async fn current_session(State(state): State<AppState>, ClientMeta(meta): ClientMeta) -> ApiResult {
    let ctx = state.gate.require_authenticated(&meta).await?;
    let roles = state.gate.resolver().resolve(&ctx.principal.id).await?;
    Ok(success(json!({
        "user": ctx.principal,
        "sessionId": ctx.session_id,
        "effectiveRole": roles.effective,
    })))
}

async fn logout(State(state): State<AppState>, ClientMeta(meta): ClientMeta) -> ApiResult {
    let ctx = state.gate.require_authenticated(&meta).await?;
    state.sessions.invalidate_session(&ctx.session_id).await?;

    state.audit.record_request(
        &meta,
        actor_for(&ctx.principal, None),
        AuditAction::SessionRevoked,
        "session",
        ctx.session_id.as_str(),
        Some(json!({ "scope": "current" })),
    );
    tracing::info!(user_id = %ctx.principal.id, session_id = %ctx.session_id, "logged out");
    Ok(success(json!({ "revoked": 1 })))
}

async fn logout_all(State(state): State<AppState>, ClientMeta(meta): ClientMeta) -> ApiResult {
    let ctx = state.gate.require_authenticated(&meta).await?;
    let revoked = state
        .sessions
        .invalidate_user_sessions(&ctx.principal.id)
        .await?;

    state.audit.record_request(
        &meta,
        actor_for(&ctx.principal, None),
        AuditAction::SessionRevoked,
        "user",
        ctx.principal.id.as_str(),
        Some(json!({ "scope": "all", "revoked": revoked })),
    );
    Ok(success(json!({ "revoked": revoked })))
}

async fn admin_overview(State(state): State<AppState>, ClientMeta(meta): ClientMeta) -> ApiResult {
    let ctx = state.gate.require_role(&meta, &ADMINS, None).await?;
    let cohorts = state.cohorts.accessible_cohorts(&ctx.principal).await?;
    Ok(success(json!({
        "user": ctx.principal,
        "effectiveRole": ctx.roles.map(|roles| roles.effective),
        "cohorts": cohorts,
    })))
}

async fn admin_analytics(State(state): State<AppState>, ClientMeta(meta): ClientMeta) -> ApiResult {
    state
        .gate
        .require_permission(&meta, Permission::CanViewAnalytics)
        .await?;
    Ok(success(json!({
        "audit": state.audit.stats(),
        "rateLimitedClients": state.limiter.tracked_keys(),
    })))
}

async fn revoke_user_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ClientMeta(meta): ClientMeta,
) -> ApiResult {
    let ctx = state
        .gate
        .require_permission(&meta, Permission::CanManageUsers)
        .await?;
    let target = UserId::new(user_id);
    let revoked = state.sessions.invalidate_user_sessions(&target).await?;

    let effective = ctx.roles.as_ref().map(|roles| &roles.effective);
    state.audit.record_request(
        &meta,
        actor_for(&ctx.principal, effective),
        AuditAction::SessionRevoked,
        "user",
        target.as_str(),
        Some(json!({ "scope": "all", "revoked": revoked })),
    );
    tracing::info!(
        actor = %ctx.principal.id,
        target = %target,
        revoked,
        "sessions revoked by admin"
    );
    Ok(success(json!({ "userId": target, "revoked": revoked })))
}

async fn cohort_home(
    State(state): State<AppState>,
    Path(cohort): Path<String>,
    ClientMeta(meta): ClientMeta,
) -> ApiResult {
    let ctx = state
        .gate
        .require_cohort_membership(&meta, &cohort, None)
        .await?;
    Ok(success(json!({ "cohort": ctx.cohort, "member": ctx.principal.id })))
}

async fn mentor_cohort(
    State(state): State<AppState>,
    Path(cohort): Path<String>,
    ClientMeta(meta): ClientMeta,
) -> ApiResult {
    let ctx = state
        .gate
        .require_role(&meta, &[Role::Mentor], Some(&cohort))
        .await?;
    Ok(success(json!({ "cohort": cohort, "mentor": ctx.principal.id })))
}

async fn my_cohorts(State(state): State<AppState>, ClientMeta(meta): ClientMeta) -> ApiResult {
    let ctx = state.gate.require_authenticated(&meta).await?;
    let cohorts = state.cohorts.accessible_cohorts(&ctx.principal).await?;
    Ok(success(json!({ "cohorts": cohorts })))
}
