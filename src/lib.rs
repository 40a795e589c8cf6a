use std::sync::Arc;

use crate::config::Config;
use crate::services::assessment_service::AssessmentService;
use crate::services::judge_service::{CodeEvaluationService, Judge0Client, JudgeClient};
use crate::services::notification_service::NotificationService;
use crate::store::DocumentStore;

pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub assessment_service: AssessmentService,
    pub code_evaluation_service: CodeEvaluationService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        let judge = Arc::new(Judge0Client::new(
            reqwest::Client::new(),
            config.judge0_api_url.clone(),
            config.judge0_api_key.clone(),
            config.judge0_api_host.clone(),
        ));
        Self::with_judge(store, config, judge)
    }

    /// Same wiring with the judge swapped out, for tests that must not
    /// reach the network.
    pub fn with_judge(
        store: Arc<dyn DocumentStore>,
        config: &Config,
        judge: Arc<dyn JudgeClient>,
    ) -> Self {
        Self {
            store: Arc::clone(&store),
            assessment_service: AssessmentService::new(
                Arc::clone(&store),
                config.default_client_domain.clone(),
            ),
            code_evaluation_service: CodeEvaluationService::new(judge),
            notification_service: NotificationService::new(
                store,
                config.default_client_domain.clone(),
            ),
        }
    }
}
