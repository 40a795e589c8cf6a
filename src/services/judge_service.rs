use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::question::TestCaseRecord;

/// Judge0 status id for an accepted run.
const ACCEPTED_STATUS_ID: i32 = 3;

/// Fixed language table; anything unknown silently falls back to JavaScript,
/// mirroring the judge integration contract.
pub fn language_id(language: &str) -> i32 {
    match language.to_lowercase().as_str() {
        "python" => 71,
        "javascript" => 63,
        "java" => 62,
        "cpp" => 54,
        "c" => 50,
        _ => 63,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JudgeSubmission {
    pub source_code: String,
    pub language_id: i32,
    pub stdin: String,
    pub expected_output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeStatus {
    pub id: i32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeResponse {
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub status: JudgeStatus,
}

/// One synchronous submission to the external judge. The trait seam keeps the
/// evaluation loop testable without network access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn submit(&self, submission: &JudgeSubmission) -> Result<JudgeResponse>;
}

#[derive(Clone)]
pub struct Judge0Client {
    client: Client,
    base_url: String,
    api_key: String,
    api_host: String,
}

impl Judge0Client {
    pub fn new(client: Client, base_url: String, api_key: String, api_host: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            api_host,
        }
    }
}

#[async_trait]
impl JudgeClient for Judge0Client {
    async fn submit(&self, submission: &JudgeSubmission) -> Result<JudgeResponse> {
        // wait=true asks the judge for blocking semantics; no polling loop.
        let response = self
            .client
            .post(format!(
                "{}/submissions/?base64_encoded=false&wait=true",
                self.base_url
            ))
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .json(submission)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<JudgeResponse>().await?)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub passed: bool,
    pub status: String,
    pub marks: i32,
    pub obtained_marks: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOutcome {
    pub test_cases: Vec<TestCaseResult>,
    pub total_marks: i32,
    pub obtained_marks: i32,
    pub accuracy: f64,
    pub passed_count: usize,
    pub total_count: usize,
}

#[derive(Clone)]
pub struct CodeEvaluationService {
    judge: Arc<dyn JudgeClient>,
}

impl CodeEvaluationService {
    pub fn new(judge: Arc<dyn JudgeClient>) -> Self {
        Self { judge }
    }

    /// Runs every test case strictly in order, one blocking judge call each.
    /// Any transport or API failure aborts the whole evaluation with no
    /// partial results.
    pub async fn evaluate(
        &self,
        source_code: &str,
        language: &str,
        test_cases: &[TestCaseRecord],
    ) -> Result<EvaluationOutcome> {
        let language_id = language_id(language);
        let mut results = Vec::with_capacity(test_cases.len());
        let mut total_marks = 0;
        let mut obtained_marks = 0;

        for test_case in test_cases {
            total_marks += test_case.marks;

            let submission = JudgeSubmission {
                source_code: source_code.to_string(),
                language_id,
                stdin: test_case.inputs.input.clone(),
                expected_output: test_case.expected_output.trim().to_string(),
            };

            let verdict = self.judge.submit(&submission).await.map_err(|err| {
                tracing::error!(error = %err, "Judge0 execution error");
                Error::Judge("Failed to execute code with Judge0".to_string())
            })?;

            let stdout = verdict.stdout.unwrap_or_default();
            let passed = verdict.status.id == ACCEPTED_STATUS_ID
                && stdout.trim() == test_case.expected_output.trim();
            if passed {
                obtained_marks += test_case.marks;
            }

            results.push(TestCaseResult {
                input: test_case.inputs.input.clone(),
                expected_output: test_case.expected_output.clone(),
                actual_output: stdout,
                passed,
                status: verdict.status.description,
                marks: test_case.marks,
                obtained_marks: if passed { test_case.marks } else { 0 },
            });
        }

        let accuracy = if total_marks > 0 {
            round2(f64::from(obtained_marks) / f64::from(total_marks) * 100.0)
        } else {
            0.0
        };
        let passed_count = results.iter().filter(|r| r.passed).count();
        let total_count = results.len();

        Ok(EvaluationOutcome {
            test_cases: results,
            total_marks,
            obtained_marks,
            accuracy,
            passed_count,
            total_count,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
