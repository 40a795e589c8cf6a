use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    )
)]
#[axum::debug_handler]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "service": "placement-backend",
        }
    }))
}
