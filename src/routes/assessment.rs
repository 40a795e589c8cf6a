use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::dto::assessment_dto::{
    AssessmentListQuery, CreateAssessmentPayload, UpdateAssessmentPayload,
};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::services::assessment_service::{AssessmentFilter, DEFAULT_LIST_LIMIT};
use crate::store::LastKey;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/assessments",
    responses(
        (status = 201, description = "Assessment created"),
        (status = 400, description = "Invalid payload or unclassifiable question"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
#[axum::debug_handler]
pub async fn create_assessment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssessmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let assessment = state
        .assessment_service
        .create(payload, claims.identity())
        .await?;
    info!(assessment_id = %assessment.assessment_id, "assessment created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": assessment })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/assessments",
    responses(
        (status = 200, description = "Page of assessments"),
        (status = 400, description = "Malformed continuation key"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
#[axum::debug_handler]
pub async fn list_assessments(
    State(state): State<AppState>,
    Query(query): Query<AssessmentListQuery>,
) -> Result<impl IntoResponse> {
    let last_key = query
        .last_key
        .as_deref()
        .map(|raw| {
            serde_json::from_str::<LastKey>(raw)
                .map_err(|_| Error::BadRequest("Invalid lastKey".to_string()))
        })
        .transpose()?;

    let page = state
        .assessment_service
        .list(
            AssessmentFilter {
                department: query.department,
                status: query.status,
            },
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            last_key,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "items": page.items,
            "lastKey": page.last_key,
        }
    })))
}

#[utoipa::path(
    get,
    path = "/api/assessments/{id}",
    responses(
        (status = 200, description = "Assessment found"),
        (status = 404, description = "No assessment with this id"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
#[axum::debug_handler]
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let assessment = state
        .assessment_service
        .get_by_id(&id)
        .await?
        .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))?;
    Ok(Json(json!({ "success": true, "data": assessment })))
}

#[utoipa::path(
    put,
    path = "/api/assessments/{id}",
    responses(
        (status = 200, description = "Assessment updated"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "No assessment with this id"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
#[axum::debug_handler]
pub async fn update_assessment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAssessmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let updated = state
        .assessment_service
        .update(&id, payload, Some(claims.identity()))
        .await?;
    info!(assessment_id = %id, "assessment updated");
    Ok(Json(json!({ "success": true, "data": updated })))
}

#[utoipa::path(
    delete,
    path = "/api/assessments/{id}",
    responses(
        (status = 200, description = "Assessment deleted"),
        (status = 404, description = "No assessment with this id"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
#[axum::debug_handler]
pub async fn delete_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.assessment_service.delete(&id).await?;
    info!(assessment_id = %id, "assessment deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Assessment deleted successfully"
    })))
}
