use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;
use tracing::info;

use crate::dto::evaluation_dto::EvaluateCodePayload;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::question::TestCaseRecord;
use crate::utils::time;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/code-evaluation/evaluate",
    responses(
        (status = 200, description = "Per-test-case verdicts with aggregate marks"),
        (status = 400, description = "Missing fields or question has no test cases"),
        (status = 404, description = "Assessment or question not found"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Judge execution failed")
    )
)]
#[axum::debug_handler]
pub async fn evaluate_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EvaluateCodePayload>,
) -> Result<impl IntoResponse> {
    let (Some(assessment_id), Some(question_id), Some(code), Some(language)) = (
        payload.assessment_id,
        payload.question_id,
        payload.code,
        payload.language,
    ) else {
        return Err(Error::BadRequest(
            "assessmentId, questionId, code and language are required".to_string(),
        ));
    };

    let assessment = state
        .assessment_service
        .get_by_id(&assessment_id)
        .await?
        .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))?;

    // Clients send either the bare question id or one prefixed with the
    // assessment id, depending on which screen they came from.
    let question = assessment["questions"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|q| {
            let qid = q["questionId"].as_str().unwrap_or_default();
            qid == question_id || format!("{}_{}", assessment_id, qid) == question_id
        })
        .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;

    let test_cases: Vec<TestCaseRecord> =
        serde_json::from_value(question["testCases"].clone()).unwrap_or_default();
    if test_cases.is_empty() {
        return Err(Error::BadRequest(
            "No test cases available for this question".to_string(),
        ));
    }

    let outcome = state
        .code_evaluation_service
        .evaluate(&code, &language, &test_cases)
        .await?;

    info!(
        assessment_id = %assessment_id,
        question_id = %question_id,
        passed = outcome.passed_count,
        total = outcome.total_count,
        "code evaluated"
    );
    Ok(Json(json!({
        "success": true,
        "data": {
            "assessmentId": assessment_id,
            "questionId": question_id,
            "studentId": claims.identity(),
            "language": language,
            "testCases": outcome.test_cases,
            "totalMarks": outcome.total_marks,
            "obtainedMarks": outcome.obtained_marks,
            "accuracy": outcome.accuracy,
            "passedCount": outcome.passed_count,
            "totalCount": outcome.total_count,
            "timestamp": time::to_rfc3339(time::now()),
        }
    })))
}
