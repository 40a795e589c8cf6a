use serde::{Deserialize, Serialize};

/// All fields optional so a missing one maps to the 400 contract instead of
/// a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateCodePayload {
    pub assessment_id: Option<String>,
    pub question_id: Option<String>,
    pub code: Option<String>,
    pub language: Option<String>,
}
