use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::assessment::{Configuration, Stats};
use crate::models::question::AnswerOption;

/// A question as authored in the builder UI. Which optional fields are
/// populated decides the variant; see `models::question::classify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoredQuestion {
    pub text: Option<String>,
    pub question: Option<String>,
    pub marks: Option<i32>,
    pub points: Option<i32>,
    pub difficulty: Option<String>,
    pub subcategory: Option<String>,
    pub options: Option<Vec<OptionInput>>,
    pub correct_answer: Option<CorrectAnswerInput>,
    pub starter_code: Option<String>,
    pub test_cases: Option<Vec<TestCaseInput>>,
}

impl AuthoredQuestion {
    /// The builder sends either `text` or `question` for the prompt.
    pub fn text(&self) -> &str {
        self.text
            .as_deref()
            .or(self.question.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionInput {
    Structured(AnswerOption),
    Text(String),
}

impl OptionInput {
    pub fn text(&self) -> &str {
        match self {
            OptionInput::Text(text) => text,
            OptionInput::Structured(option) => &option.text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswerInput {
    Many(Vec<String>),
    One(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseInput {
    pub input: String,
    pub expected_output: String,
    pub marks: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingInput {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentPayload {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<i64>,
    pub max_attempts: Option<i64>,
    pub passing_score: Option<f64>,
    pub randomize_questions: Option<bool>,
    pub total_questions: Option<i64>,
    pub scheduling: Option<SchedulingInput>,
    pub target_departments: Option<Vec<String>>,
    pub target_years: Option<Vec<String>>,
    pub status: Option<String>,
    pub is_published: Option<bool>,
    pub published_at: Option<String>,
    pub created_by_name: Option<String>,
    #[serde(default)]
    pub questions: Vec<AuthoredQuestion>,
}

/// Enumerated partial update: only these fields can be overwritten, so the
/// identity and key attributes stay out of reach of the update path.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssessmentPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub status: Option<String>,
    pub is_published: Option<bool>,
    pub published_at: Option<String>,
    pub scheduling: Option<SchedulingInput>,
    pub configuration: Option<Configuration>,
    pub target_departments: Option<Vec<String>>,
    pub target_years: Option<Vec<String>>,
    pub questions: Option<Vec<AuthoredQuestion>>,
    pub stats: Option<Stats>,
    pub updated_by_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentListQuery {
    pub department: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    /// Opaque continuation key from a previous page, passed back verbatim.
    pub last_key: Option<String>,
}
