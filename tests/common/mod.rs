use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;

use async_trait::async_trait;
use placement_backend::config::{get_config, init_config, Config};
use placement_backend::middleware::auth::Claims;
use placement_backend::routes::build_router;
use placement_backend::services::judge_service::{
    JudgeClient, JudgeResponse, JudgeStatus, JudgeSubmission,
};
use placement_backend::store::memory::MemStore;
use placement_backend::AppState;

/// Judge stand-in that "accepts" every run and echoes the expected output,
/// so evaluation flows can be exercised end to end without the network.
pub struct EchoJudge;

#[async_trait]
impl JudgeClient for EchoJudge {
    async fn submit(
        &self,
        submission: &JudgeSubmission,
    ) -> placement_backend::error::Result<JudgeResponse> {
        Ok(JudgeResponse {
            stdout: Some(submission.expected_output.clone()),
            stderr: None,
            compile_output: None,
            message: None,
            status: JudgeStatus {
                id: 3,
                description: "Accepted".to_string(),
            },
        })
    }
}

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> &'static Config {
    std::env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    std::env::set_var("DATABASE_URL", "postgres://unused/unused");
    std::env::set_var("JWT_SECRET", JWT_SECRET);
    // Another test may have initialized it already; the values are the same.
    let _ = init_config();
    get_config()
}

pub fn test_app(judge: Arc<dyn JudgeClient>) -> (Router, Arc<MemStore>) {
    let config = test_config();
    let store = Arc::new(MemStore::new());
    let state = AppState::with_judge(Arc::clone(&store) as _, config, judge);
    (build_router(state), store)
}

pub fn bearer_token(email: &str) -> String {
    let claims = Claims {
        sub: "user-1".to_string(),
        exp: 4_000_000_000,
        email: Some(email.to_string()),
        username: None,
        name: Some("Test Staff".to_string()),
        role: Some("staff".to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("token encodes")
}

pub fn authed_json_request(method: &str, uri: &str, email: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", bearer_token(email)))
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub fn authed_request(method: &str, uri: &str, email: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", bearer_token(email)))
        .body(Body::empty())
        .expect("request builds")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}
