use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use common::Envelope;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::{self, ServerState};
use service::access::Permission;

pub mod services;
pub mod users;

pub async fn health() -> (StatusCode, Json<Envelope>) {
    (StatusCode::OK, Json(Envelope::success("ok", serde_json::Value::String(String::new()))))
}

/// Build the full application router: public, authenticated, staff and
/// admin route groups, with principal resolution ahead of all of them.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/register", post(users::register))
        .route("/auth/login", post(users::login));

    let authenticated = Router::new()
        .route("/services", get(services::list_services))
        .route("/services/:id", get(services::service_detail))
        .route("/nearby", get(services::nearby))
        .route_layer(middleware::from_fn(|req: axum::extract::Request, next: middleware::Next| {
            auth::require_permission(Permission::IsAuthenticated, req, next)
        }));

    let staff = Router::new()
        .route("/services/create", post(services::create_service))
        .route("/services/:id/update", put(services::update_service))
        .route_layer(middleware::from_fn(|req: axum::extract::Request, next: middleware::Next| {
            auth::require_permission(Permission::IsStaffOrAdmin, req, next)
        }));

    let admin = Router::new()
        .route("/services/:id/delete", delete(services::delete_service))
        .route("/users", get(users::list_users))
        .route("/users/:id/update-role", patch(users::update_role))
        .route("/users/:id/disable", patch(users::toggle_status))
        .route("/admin/create-user", post(users::admin_create_user))
        .route("/activity-logs", get(users::activity_logs))
        .route_layer(middleware::from_fn(|req: axum::extract::Request, next: middleware::Next| {
            auth::require_permission(Permission::IsAdmin, req, next)
        }));

    public
        .merge(authenticated)
        .merge(staff)
        .merge(admin)
        // principal resolution is the outer layer so the quota below sees
        // the authenticated identity
        .layer(middleware::from_fn_with_state(state.clone(), auth::enforce_throttle))
        .layer(middleware::from_fn_with_state(state.clone(), auth::resolve_principal))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
