use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/student/notifications",
    responses(
        (status = 200, description = "Notifications for the caller"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let notifications = state
        .notification_service
        .notifications_for_user(&claims.sub)
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "notifications": notifications,
            "unreadCount": 0,
        }
    })))
}

#[utoipa::path(
    post,
    path = "/api/student/notifications/{id}/read",
    responses(
        (status = 200, description = "Acknowledged"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
#[axum::debug_handler]
pub async fn mark_notification_read(
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    // Read state lives in the external delivery system; acknowledge so the
    // client can update optimistically.
    debug!(user = %claims.sub, notification_id = %id, "mark-read acknowledged");
    Ok(Json(json!({ "success": true, "message": "Notification marked as read" })))
}

#[utoipa::path(
    post,
    path = "/api/student/notifications/mark-all",
    responses(
        (status = 200, description = "Acknowledged"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    debug!(user = %claims.sub, "mark-all-read acknowledged");
    Ok(Json(json!({ "success": true, "message": "All notifications marked as read" })))
}
