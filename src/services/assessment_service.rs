use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::dto::assessment_dto::{CreateAssessmentPayload, UpdateAssessmentPayload};
use crate::error::{Error, Result};
use crate::models::assessment::{Assessment, Configuration, Scheduling, Stats, Target};
use crate::models::question::{build_questions, plan_batches};
use crate::store::{Document, DocumentStore, LastKey};
use crate::utils::identity::domain_from_email;
use crate::utils::time;

pub const ASSESSMENT_PK_PREFIX: &str = "ASSESSMENT#";
pub const CLIENT_SK_PREFIX: &str = "CLIENT#";
const COUNTER_PK_PREFIX: &str = "COUNTER#ASSESS_";
const SEQUENCE_SCAN_PAGE: i64 = 200;

pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Fixed name→code table; unmapped names fall back to the first three
/// characters uppercased, empty input to GEN.
pub fn department_code(department: &str) -> String {
    match department {
        "" => "GEN".to_string(),
        "Computer Science" => "CSE".to_string(),
        "Information Technology" => "IT".to_string(),
        "Electronics" => "ECE".to_string(),
        "Mechanical" => "ME".to_string(),
        "Civil" => "CE".to_string(),
        other => other.chars().take(3).collect::<String>().to_uppercase(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssessmentFilter {
    pub department: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug)]
pub struct AssessmentPage {
    pub items: Vec<JsonValue>,
    pub last_key: Option<LastKey>,
}

#[derive(Clone)]
pub struct AssessmentService {
    store: Arc<dyn DocumentStore>,
    default_domain: String,
}

impl AssessmentService {
    pub fn new(store: Arc<dyn DocumentStore>, default_domain: String) -> Self {
        Self {
            store,
            default_domain,
        }
    }

    pub async fn create(
        &self,
        payload: CreateAssessmentPayload,
        created_by: &str,
    ) -> Result<Assessment> {
        let department = payload.department.clone().unwrap_or_default();
        let dept_code = department_code(&department);
        let domain = domain_from_email(created_by, &self.default_domain);
        let sequence = self.next_sequence(&dept_code, &domain).await;
        let assessment_id = format!("ASSESS_{}_{}", sequence, dept_code);

        let difficulty = payload
            .difficulty
            .clone()
            .unwrap_or_else(|| "MEDIUM".to_string())
            .to_uppercase();
        let questions = build_questions(&payload.questions, &difficulty)?;

        let batch_plan = plan_batches(&questions);
        debug!(
            assessment_id = %assessment_id,
            batches = batch_plan.len(),
            "planned entity batches for external delivery"
        );

        let now = time::to_rfc3339(time::now());
        let is_published = payload.is_published.unwrap_or(false);
        let total_questions = payload.total_questions.unwrap_or(questions.len() as i64);

        let assessment = Assessment {
            assessment_id: assessment_id.clone(),
            title: payload.title,
            description: payload.description.unwrap_or_default(),
            department: department.clone(),
            department_code: dept_code,
            difficulty,
            category: "MCQ".to_string(),
            assessment_type: "DEPARTMENT_WISE".to_string(),
            domain: domain.clone(),
            configuration: Configuration {
                duration: payload.duration.unwrap_or(60),
                max_attempts: payload.max_attempts.unwrap_or(1),
                passing_score: payload.passing_score.unwrap_or(50.0),
                randomize_questions: payload.randomize_questions.unwrap_or(false),
                total_questions,
            },
            scheduling: payload
                .scheduling
                .map(|s| Scheduling {
                    start_date: s.start_date,
                    end_date: s.end_date,
                    timezone: s.timezone.unwrap_or_else(|| "Asia/Kolkata".to_string()),
                })
                .unwrap_or_default(),
            target: Target {
                departments: payload
                    .target_departments
                    .unwrap_or_else(|| vec![department]),
                years: payload.target_years.unwrap_or_default(),
            },
            questions,
            stats: Stats::default(),
            status: payload.status.unwrap_or_else(|| "ACTIVE".to_string()),
            is_published,
            published_at: is_published.then(|| payload.published_at.unwrap_or_else(|| now.clone())),
            created_by: created_by.to_string(),
            created_by_name: payload
                .created_by_name
                .unwrap_or_else(|| created_by.to_string()),
            created_at: now.clone(),
            updated_at: now,
            updated_by: None,
            updated_by_name: None,
        };

        self.store
            .put(Document {
                pk: format!("{}{}", ASSESSMENT_PK_PREFIX, assessment_id),
                sk: format!("{}{}", CLIENT_SK_PREFIX, domain),
                attributes: serde_json::to_value(&assessment)?,
            })
            .await?;

        Ok(assessment)
    }

    /// The tenant domain portion of the key is not known from the id alone,
    /// so lookups scan by PK prefix under the CLIENT sort-key namespace.
    async fn find_document(&self, assessment_id: &str) -> Result<Option<Document>> {
        let pk = format!("{}{}", ASSESSMENT_PK_PREFIX, assessment_id);
        let page = self.store.scan(&pk, CLIENT_SK_PREFIX, 1, None).await?;
        // The prefix scan can also surface ids that merely extend this one,
        // so hold out for the exact partition key.
        Ok(page.items.into_iter().find(|doc| doc.pk == pk))
    }

    pub async fn get_by_id(&self, assessment_id: &str) -> Result<Option<JsonValue>> {
        Ok(self
            .find_document(assessment_id)
            .await?
            .map(|doc| doc.attributes))
    }

    pub async fn list(
        &self,
        filter: AssessmentFilter,
        limit: i64,
        last_key: Option<LastKey>,
    ) -> Result<AssessmentPage> {
        let page = self
            .store
            .scan(ASSESSMENT_PK_PREFIX, CLIENT_SK_PREFIX, limit, last_key)
            .await?;

        let items = page
            .items
            .into_iter()
            .map(|doc| doc.attributes)
            .filter(|attrs| {
                filter
                    .department
                    .as_deref()
                    .is_none_or(|dept| attrs["department"] == dept)
                    && filter
                        .status
                        .as_deref()
                        .is_none_or(|status| attrs["status"] == status)
            })
            .collect();

        Ok(AssessmentPage {
            items,
            last_key: page.last_key,
        })
    }

    pub async fn update(
        &self,
        assessment_id: &str,
        payload: UpdateAssessmentPayload,
        updated_by: Option<&str>,
    ) -> Result<JsonValue> {
        let current = self
            .find_document(assessment_id)
            .await?
            .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))?;

        let mut updates = serde_json::Map::new();
        if let Some(title) = payload.title {
            updates.insert("title".to_string(), JsonValue::String(title));
        }
        if let Some(description) = payload.description {
            updates.insert("description".to_string(), JsonValue::String(description));
        }
        if let Some(difficulty) = payload.difficulty {
            updates.insert(
                "difficulty".to_string(),
                JsonValue::String(difficulty.to_uppercase()),
            );
        }
        if let Some(status) = payload.status {
            updates.insert("status".to_string(), JsonValue::String(status));
        }
        if let Some(is_published) = payload.is_published {
            updates.insert("isPublished".to_string(), JsonValue::Bool(is_published));
            if is_published {
                let published_at = payload
                    .published_at
                    .unwrap_or_else(|| time::to_rfc3339(time::now()));
                updates.insert("publishedAt".to_string(), JsonValue::String(published_at));
            }
        }
        if let Some(scheduling) = payload.scheduling {
            let scheduling = Scheduling {
                start_date: scheduling.start_date,
                end_date: scheduling.end_date,
                timezone: scheduling
                    .timezone
                    .unwrap_or_else(|| "Asia/Kolkata".to_string()),
            };
            updates.insert("scheduling".to_string(), serde_json::to_value(scheduling)?);
        }
        if let Some(configuration) = payload.configuration {
            updates.insert(
                "configuration".to_string(),
                serde_json::to_value(configuration)?,
            );
        }
        if payload.target_departments.is_some() || payload.target_years.is_some() {
            let current_target: Target =
                serde_json::from_value(current.attributes["target"].clone()).unwrap_or_default();
            let target = Target {
                departments: payload
                    .target_departments
                    .unwrap_or(current_target.departments),
                years: payload.target_years.unwrap_or(current_target.years),
            };
            updates.insert("target".to_string(), serde_json::to_value(target)?);
        }
        if let Some(authored) = payload.questions {
            let difficulty = current.attributes["difficulty"]
                .as_str()
                .unwrap_or("MEDIUM")
                .to_string();
            let questions = build_questions(&authored, &difficulty)?;
            updates.insert("questions".to_string(), serde_json::to_value(&questions)?);
            // The question count lives inside configuration; fold the new
            // count into whichever configuration value is being written.
            let mut configuration = match updates.remove("configuration") {
                Some(value) => value,
                None => current.attributes["configuration"].clone(),
            };
            let count = JsonValue::from(questions.len() as i64);
            match configuration.as_object_mut() {
                Some(map) => {
                    map.insert("totalQuestions".to_string(), count);
                }
                None => configuration = serde_json::json!({ "totalQuestions": count }),
            }
            updates.insert("configuration".to_string(), configuration);
        }
        if let Some(stats) = payload.stats {
            updates.insert("stats".to_string(), serde_json::to_value(stats)?);
        }

        updates.insert(
            "updatedAt".to_string(),
            JsonValue::String(time::to_rfc3339(time::now())),
        );
        if let Some(updated_by) = updated_by {
            updates.insert(
                "updatedBy".to_string(),
                JsonValue::String(updated_by.to_string()),
            );
            if let Some(updated_by_name) = payload.updated_by_name {
                updates.insert(
                    "updatedByName".to_string(),
                    JsonValue::String(updated_by_name),
                );
            }
        }

        let updated = self
            .store
            .update_attributes(&current.pk, &current.sk, updates)
            .await?;
        Ok(updated.attributes)
    }

    pub async fn delete(&self, assessment_id: &str) -> Result<()> {
        let current = self
            .find_document(assessment_id)
            .await?
            .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))?;

        self.store.delete(&current.pk, &current.sk).await?;

        // Older data shapes stored questions as separate items under the same
        // id prefix; clean them up best-effort.
        if let Err(err) = self.delete_legacy_questions(assessment_id, &current).await {
            warn!(
                assessment_id = %assessment_id,
                error = %err,
                "legacy question cleanup failed"
            );
        }
        Ok(())
    }

    async fn delete_legacy_questions(&self, assessment_id: &str, current: &Document) -> Result<()> {
        let mut last_key = None;
        loop {
            let page = self
                .store
                .scan(
                    &format!("{}{}", ASSESSMENT_PK_PREFIX, assessment_id),
                    &current.sk,
                    SEQUENCE_SCAN_PAGE,
                    last_key,
                )
                .await?;
            for item in &page.items {
                if item.pk != current.pk {
                    self.store.delete(&item.pk, &item.sk).await?;
                }
            }
            match page.last_key {
                Some(key) => last_key = Some(key),
                None => return Ok(()),
            }
        }
    }

    /// Next department-scoped sequence number, zero-padded to three digits.
    ///
    /// The old scan-then-increment pattern raced under concurrent creation;
    /// the counter item makes the increment atomic while the legacy scan
    /// keeps continuity with records written before the counter existed.
    async fn next_sequence(&self, dept_code: &str, domain: &str) -> String {
        let legacy_max = match self.legacy_max_sequence(dept_code, domain).await {
            Ok(max) => max,
            Err(err) => {
                warn!(error = %err, dept_code, "sequence scan failed, falling back to 0");
                0
            }
        };

        match self
            .store
            .increment_at_least(
                &format!("{}{}", COUNTER_PK_PREFIX, dept_code),
                &format!("{}{}", CLIENT_SK_PREFIX, domain),
                legacy_max,
            )
            .await
        {
            Ok(next) => format!("{:03}", next),
            Err(err) => {
                warn!(error = %err, dept_code, "sequence counter failed, falling back to 001");
                "001".to_string()
            }
        }
    }

    async fn legacy_max_sequence(&self, dept_code: &str, domain: &str) -> Result<i64> {
        let suffix = format!("_{}", dept_code);
        let sk = format!("{}{}", CLIENT_SK_PREFIX, domain);
        let mut max = 0;
        let mut last_key = None;

        loop {
            let page = self
                .store
                .scan(
                    &format!("{}ASSESS_", ASSESSMENT_PK_PREFIX),
                    &sk,
                    SEQUENCE_SCAN_PAGE,
                    last_key,
                )
                .await?;

            for item in &page.items {
                if !item.pk.ends_with(&suffix) {
                    continue;
                }
                // ASSESSMENT#ASSESS_<NNN>_<DEPT>: the number is the second
                // underscore-separated segment.
                let parts: Vec<&str> = item
                    .pk
                    .trim_start_matches(ASSESSMENT_PK_PREFIX)
                    .split('_')
                    .collect();
                if parts.len() >= 3 {
                    if let Ok(number) = parts[1].parse::<i64>() {
                        max = max.max(number);
                    }
                }
            }

            match page.last_key {
                Some(key) => last_key = Some(key),
                None => return Ok(max),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::assessment_dto::{AuthoredQuestion, OptionInput, SchedulingInput};
    use crate::store::memory::MemStore;
    use serde_json::json;

    fn service(store: Arc<MemStore>) -> AssessmentService {
        AssessmentService::new(store, "ksrce.ac.in".to_string())
    }

    fn mcq_question() -> AuthoredQuestion {
        AuthoredQuestion {
            text: Some("Capital of France?".to_string()),
            question: None,
            marks: Some(2),
            points: None,
            difficulty: None,
            subcategory: Some("aptitude".to_string()),
            options: Some(vec![
                OptionInput::Text("Paris".to_string()),
                OptionInput::Text("London".to_string()),
            ]),
            correct_answer: Some(crate::dto::assessment_dto::CorrectAnswerInput::One(
                "A".to_string(),
            )),
            starter_code: None,
            test_cases: None,
        }
    }

    fn payload(title: &str, department: &str) -> CreateAssessmentPayload {
        CreateAssessmentPayload {
            title: title.to_string(),
            description: Some("desc".to_string()),
            department: Some(department.to_string()),
            difficulty: None,
            duration: None,
            max_attempts: None,
            passing_score: None,
            randomize_questions: None,
            total_questions: None,
            scheduling: Some(SchedulingInput {
                start_date: Some("2026-09-01T09:00:00Z".to_string()),
                end_date: Some("2026-09-01T11:00:00Z".to_string()),
                timezone: None,
            }),
            target_departments: None,
            target_years: None,
            status: None,
            is_published: None,
            published_at: None,
            created_by_name: Some("Staff One".to_string()),
            questions: vec![mcq_question()],
        }
    }

    #[test]
    fn department_codes_follow_the_lookup_table() {
        assert_eq!(department_code("Computer Science"), "CSE");
        assert_eq!(department_code("Information Technology"), "IT");
        assert_eq!(department_code("Electronics"), "ECE");
        assert_eq!(department_code("Mechanical"), "ME");
        assert_eq!(department_code("Civil"), "CE");
        assert_eq!(department_code("Biotechnology"), "BIO");
        assert_eq!(department_code(""), "GEN");
    }

    #[tokio::test]
    async fn first_assessment_for_a_department_is_001() {
        let store = Arc::new(MemStore::new());
        let svc = service(store);
        let created = svc
            .create(payload("First", "Computer Science"), "staff@ksrce.ac.in")
            .await
            .unwrap();
        assert_eq!(created.assessment_id, "ASSESS_001_CSE");
        assert_eq!(created.department_code, "CSE");
        assert_eq!(created.domain, "ksrce.ac.in");
    }

    #[tokio::test]
    async fn sequence_continues_from_legacy_records_per_department() {
        let store = Arc::new(MemStore::new());
        for n in [1, 2, 5] {
            store
                .put(Document {
                    pk: format!("ASSESSMENT#ASSESS_{:03}_CSE", n),
                    sk: "CLIENT#ksrce.ac.in".to_string(),
                    attributes: json!({"assessmentId": format!("ASSESS_{:03}_CSE", n)}),
                })
                .await
                .unwrap();
        }
        // Another department's numbering must not leak in.
        store
            .put(Document {
                pk: "ASSESSMENT#ASSESS_009_ECE".to_string(),
                sk: "CLIENT#ksrce.ac.in".to_string(),
                attributes: json!({}),
            })
            .await
            .unwrap();

        let svc = service(store);
        let created = svc
            .create(payload("Next", "Computer Science"), "staff@ksrce.ac.in")
            .await
            .unwrap();
        assert_eq!(created.assessment_id, "ASSESS_006_CSE");
    }

    #[tokio::test]
    async fn sequence_is_monotonic_across_creations() {
        let store = Arc::new(MemStore::new());
        let svc = service(store);
        let a = svc
            .create(payload("A", "Electronics"), "staff@ksrce.ac.in")
            .await
            .unwrap();
        let b = svc
            .create(payload("B", "Electronics"), "staff@ksrce.ac.in")
            .await
            .unwrap();
        assert_eq!(a.assessment_id, "ASSESS_001_ECE");
        assert_eq!(b.assessment_id, "ASSESS_002_ECE");
    }

    #[tokio::test]
    async fn created_record_has_defaults_and_embedded_questions() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let created = svc
            .create(payload("Aptitude Drill", "Civil"), "staff@ksrce.ac.in")
            .await
            .unwrap();

        assert_eq!(created.status, "ACTIVE");
        assert!(!created.is_published);
        assert_eq!(created.configuration.duration, 60);
        assert_eq!(created.configuration.passing_score, 50.0);
        assert_eq!(created.configuration.total_questions, 1);
        assert_eq!(created.target.departments, vec!["Civil".to_string()]);
        assert_eq!(created.scheduling.timezone, "Asia/Kolkata");

        let stored = store
            .get("ASSESSMENT#ASSESS_001_CE", "CLIENT#ksrce.ac.in")
            .await
            .unwrap()
            .expect("persisted");
        assert_eq!(stored.attributes["questions"][0]["questionId"], "Q_001");
        assert_eq!(
            stored.attributes["questions"][0]["options"][0],
            json!({"id": "A", "text": "Paris"})
        );
        assert_eq!(
            stored.attributes["questions"][0]["correctAnswer"],
            json!(["A"])
        );
    }

    #[tokio::test]
    async fn list_filters_by_department_and_status() {
        let store = Arc::new(MemStore::new());
        let svc = service(store);
        svc.create(payload("One", "Computer Science"), "staff@ksrce.ac.in")
            .await
            .unwrap();
        let mut draft = payload("Two", "Civil");
        draft.status = Some("DRAFT".to_string());
        svc.create(draft, "staff@ksrce.ac.in").await.unwrap();

        let all = svc
            .list(AssessmentFilter::default(), DEFAULT_LIST_LIMIT, None)
            .await
            .unwrap();
        assert_eq!(all.items.len(), 2);

        let civil = svc
            .list(
                AssessmentFilter {
                    department: Some("Civil".to_string()),
                    status: None,
                },
                DEFAULT_LIST_LIMIT,
                None,
            )
            .await
            .unwrap();
        assert_eq!(civil.items.len(), 1);
        assert_eq!(civil.items[0]["title"], "Two");

        let active = svc
            .list(
                AssessmentFilter {
                    department: None,
                    status: Some("ACTIVE".to_string()),
                },
                DEFAULT_LIST_LIMIT,
                None,
            )
            .await
            .unwrap();
        assert_eq!(active.items.len(), 1);
        assert_eq!(active.items[0]["title"], "One");
    }

    fn empty_update() -> UpdateAssessmentPayload {
        UpdateAssessmentPayload {
            title: None,
            description: None,
            difficulty: None,
            status: None,
            is_published: None,
            published_at: None,
            scheduling: None,
            configuration: None,
            target_departments: None,
            target_years: None,
            questions: None,
            stats: None,
            updated_by_name: None,
        }
    }

    #[tokio::test]
    async fn update_overwrites_only_named_fields_and_stamps_audit() {
        let store = Arc::new(MemStore::new());
        let svc = service(store);
        let created = svc
            .create(payload("Before", "Computer Science"), "staff@ksrce.ac.in")
            .await
            .unwrap();

        let mut update = empty_update();
        update.title = Some("After".to_string());
        update.updated_by_name = Some("Officer".to_string());
        let updated = svc
            .update(
                &created.assessment_id,
                update,
                Some("officer@ksrce.ac.in"),
            )
            .await
            .unwrap();

        assert_eq!(updated["title"], "After");
        assert_eq!(updated["description"], "desc");
        assert_eq!(updated["updatedBy"], "officer@ksrce.ac.in");
        assert_eq!(updated["updatedByName"], "Officer");
        // Stamps share millisecond precision, so a same-instant update may
        // carry an identical timestamp; it must never move backwards.
        assert!(updated["updatedAt"].as_str().unwrap() >= created.created_at.as_str());
    }

    #[tokio::test]
    async fn replacing_questions_updates_the_count_inside_configuration() {
        let store = Arc::new(MemStore::new());
        let svc = service(store);
        let mut two_questions = payload("Counted", "Computer Science");
        two_questions.questions.push(mcq_question());
        let created = svc
            .create(two_questions, "staff@ksrce.ac.in")
            .await
            .unwrap();
        assert_eq!(created.configuration.total_questions, 2);

        let mut update = empty_update();
        update.questions = Some(vec![mcq_question()]);
        let updated = svc
            .update(&created.assessment_id, update, None)
            .await
            .unwrap();

        assert_eq!(updated["questions"].as_array().unwrap().len(), 1);
        assert_eq!(updated["configuration"]["totalQuestions"], 1);
        // The count never leaks out as a second, top-level attribute.
        assert!(updated.get("totalQuestions").is_none());
        // The rest of the configuration survives the merge.
        assert_eq!(updated["configuration"]["duration"], 60);
    }

    #[tokio::test]
    async fn repeated_updates_are_idempotent_in_content() {
        let store = Arc::new(MemStore::new());
        let svc = service(store);
        let created = svc
            .create(payload("Repeat", "Civil"), "staff@ksrce.ac.in")
            .await
            .unwrap();

        let mut update = empty_update();
        update.status = Some("COMPLETED".to_string());
        let first = svc
            .update(&created.assessment_id, update.clone(), None)
            .await
            .unwrap();
        let second = svc
            .update(&created.assessment_id, update, None)
            .await
            .unwrap();
        assert_eq!(first["status"], second["status"]);
        assert_eq!(first["title"], second["title"]);
    }

    #[tokio::test]
    async fn update_of_missing_assessment_is_not_found_with_no_write() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let err = svc
            .update("ASSESS_404_CSE", empty_update(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let page = store.scan("", "", 10, None).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_record_and_legacy_question_items() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let created = svc
            .create(payload("Doomed", "Mechanical"), "staff@ksrce.ac.in")
            .await
            .unwrap();

        // Legacy data shape: per-question items under the same id prefix.
        store
            .put(Document {
                pk: format!("ASSESSMENT#{}#Q_001", created.assessment_id),
                sk: "CLIENT#ksrce.ac.in".to_string(),
                attributes: json!({"questionId": "Q_001"}),
            })
            .await
            .unwrap();

        svc.delete(&created.assessment_id).await.unwrap();

        let leftovers = store
            .scan(
                &format!("ASSESSMENT#{}", created.assessment_id),
                "CLIENT#",
                10,
                None,
            )
            .await
            .unwrap();
        assert!(leftovers.items.is_empty());
        assert!(matches!(
            svc.delete(&created.assessment_id).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
