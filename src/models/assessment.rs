use serde::{Deserialize, Serialize};

use crate::models::question::Question;

/// Persisted assessment record. Attribute names are camelCase on the wire and
/// in the document store; both are load-bearing for existing data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub assessment_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub department: String,
    pub department_code: String,
    pub difficulty: String,
    pub category: String,
    #[serde(rename = "type")]
    pub assessment_type: String,
    pub domain: String,
    pub configuration: Configuration,
    pub scheduling: Scheduling,
    pub target: Target,
    pub questions: Vec<Question>,
    pub stats: Stats,
    pub status: String,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub created_by: String,
    pub created_by_name: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub duration: i64,
    pub max_attempts: i64,
    pub passing_score: f64,
    pub randomize_questions: bool,
    pub total_questions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub timezone: String,
}

impl Default for Scheduling {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            timezone: "Asia/Kolkata".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Target {
    pub departments: Vec<String>,
    pub years: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub avg_score: f64,
    pub completed: i64,
    pub highest_score: f64,
    pub total_participants: i64,
}
