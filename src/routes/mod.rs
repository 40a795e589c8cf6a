use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// Assessments embed their full question list, so payloads can run large.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

use crate::middleware::auth::require_bearer_auth;
use crate::middleware::cors::permissive_cors;
use crate::AppState;

pub mod assessment;
pub mod code_evaluation;
pub mod health;
pub mod notification;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/assessments",
            post(assessment::create_assessment).get(assessment::list_assessments),
        )
        .route(
            "/api/assessments/:id",
            get(assessment::get_assessment)
                .put(assessment::update_assessment)
                .delete(assessment::delete_assessment),
        )
        .route(
            "/api/code-evaluation/evaluate",
            post(code_evaluation::evaluate_code),
        )
        .route(
            "/api/student/notifications",
            get(notification::list_notifications),
        )
        .route(
            "/api/student/notifications/mark-all",
            post(notification::mark_all_notifications_read),
        )
        .route(
            "/api/student/notifications/:id/read",
            post(notification::mark_notification_read),
        )
        .route_layer(middleware::from_fn(require_bearer_auth));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(protected)
        .layer(permissive_cors())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
