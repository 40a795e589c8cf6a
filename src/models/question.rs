use serde::{Deserialize, Serialize};

use crate::dto::assessment_dto::{AuthoredQuestion, CorrectAnswerInput, OptionInput};
use crate::error::{Error, Result};

/// External batching convention: multiple-choice questions ship in chunks of
/// fifty, programming always in a single batch.
pub const MCQ_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseStdin {
    pub input: String,
}

/// Persisted test-case shape. The `inputs.input` nesting is a wire convention
/// consumed downstream and must survive round trips unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseRecord {
    pub inputs: TestCaseStdin,
    pub expected_output: String,
    #[serde(default = "default_marks")]
    pub marks: i32,
}

fn default_marks() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: String,
    pub question_number: i32,
    pub question: String,
    pub points: i32,
    pub difficulty: String,
    pub subcategory: String,
    #[serde(flatten)]
    pub details: QuestionDetails,
}

/// A question is exactly one of the two variants; the discriminant is
/// structural (which fields are present), matching the stored shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionDetails {
    MultipleChoice(MultipleChoiceDetails),
    Coding(CodingDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceDetails {
    pub entity_type: String,
    pub category: String,
    pub options: Vec<AnswerOption>,
    pub correct_answer: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodingDetails {
    pub entity_type: String,
    pub category: String,
    pub starter_code: String,
    #[serde(default)]
    pub test_cases: Vec<TestCaseRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
    Programming,
}

/// Structural classification, evaluated in order: a non-empty option list
/// with at least one non-blank text wins even when starter code is also
/// present; otherwise non-blank starter code makes it a programming question.
pub fn classify(question: &AuthoredQuestion) -> Option<QuestionKind> {
    if let Some(options) = &question.options {
        if !options.is_empty() && options.iter().any(|opt| !opt.text().trim().is_empty()) {
            return Some(QuestionKind::MultipleChoice);
        }
    }
    if question
        .starter_code
        .as_deref()
        .is_some_and(|code| !code.trim().is_empty())
    {
        return Some(QuestionKind::Programming);
    }
    None
}

/// Builds the persisted question list from authored input. Classification is
/// a validated discriminant here: a question that is neither multiple-choice
/// nor programming rejects the whole batch instead of being dropped silently.
pub fn build_questions(
    authored: &[AuthoredQuestion],
    default_difficulty: &str,
) -> Result<Vec<Question>> {
    authored
        .iter()
        .enumerate()
        .map(|(index, q)| build_question(q, index, default_difficulty))
        .collect()
}

fn build_question(
    authored: &AuthoredQuestion,
    index: usize,
    default_difficulty: &str,
) -> Result<Question> {
    let number = index as i32 + 1;
    let kind = classify(authored).ok_or_else(|| {
        Error::BadRequest(format!(
            "Question {} is neither multiple-choice (options) nor programming (starterCode)",
            number
        ))
    })?;

    let details = match kind {
        QuestionKind::MultipleChoice => QuestionDetails::MultipleChoice(MultipleChoiceDetails {
            entity_type: "mcq".to_string(),
            category: "MCQ".to_string(),
            options: normalize_options(authored.options.as_deref().unwrap_or_default()),
            correct_answer: normalize_correct_answer(authored.correct_answer.as_ref()),
        }),
        QuestionKind::Programming => QuestionDetails::Coding(CodingDetails {
            entity_type: "coding".to_string(),
            category: "PROGRAMMING".to_string(),
            starter_code: authored.starter_code.clone().unwrap_or_default(),
            test_cases: authored
                .test_cases
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|tc| TestCaseRecord {
                    inputs: TestCaseStdin {
                        input: tc.input.clone(),
                    },
                    expected_output: tc.expected_output.clone(),
                    marks: tc.marks.unwrap_or(1),
                })
                .collect(),
        }),
    };

    Ok(Question {
        question_id: format!("Q_{:03}", number),
        question_number: number,
        question: authored.text().to_string(),
        points: authored.marks.or(authored.points).unwrap_or(1),
        difficulty: authored
            .difficulty
            .as_deref()
            .unwrap_or(default_difficulty)
            .to_uppercase(),
        subcategory: authored
            .subcategory
            .clone()
            .unwrap_or_else(|| "technical".to_string()),
        details,
    })
}

/// String options become `{id, text}` with sequential letter ids in input
/// order; already-structured options pass through unchanged.
pub fn normalize_options(options: &[OptionInput]) -> Vec<AnswerOption> {
    options
        .iter()
        .enumerate()
        .map(|(index, opt)| match opt {
            OptionInput::Text(text) => AnswerOption {
                id: char::from_u32('A' as u32 + index as u32)
                    .unwrap_or('?')
                    .to_string(),
                text: text.clone(),
            },
            OptionInput::Structured(option) => option.clone(),
        })
        .collect()
}

/// The correct-answer field is always persisted as an array of option ids.
pub fn normalize_correct_answer(answer: Option<&CorrectAnswerInput>) -> Vec<String> {
    match answer {
        Some(CorrectAnswerInput::Many(ids)) => ids.clone(),
        Some(CorrectAnswerInput::One(id)) => vec![id.clone()],
        None => Vec::new(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub batch: String,
}

/// Plans the batch descriptors mirrored to the external delivery system:
/// ceil(mcq / 50) MCQ batches each carrying the distinct subcategories across
/// all multiple-choice questions, plus a single programming batch when any
/// programming question exists.
pub fn plan_batches(questions: &[Question]) -> Vec<BatchDescriptor> {
    let mut subcategories = std::collections::BTreeSet::new();
    let mut mcq_count = 0usize;
    let mut has_coding = false;

    for question in questions {
        match &question.details {
            QuestionDetails::MultipleChoice(_) => {
                mcq_count += 1;
                subcategories.insert(question.subcategory.clone());
            }
            QuestionDetails::Coding(_) => has_coding = true,
        }
    }

    let mut batches = Vec::new();
    if mcq_count > 0 {
        let mcq_batches = mcq_count.div_ceil(MCQ_BATCH_SIZE);
        let subcategories: Vec<String> = subcategories.into_iter().collect();
        for i in 1..=mcq_batches {
            batches.push(BatchDescriptor {
                kind: "MCQ".to_string(),
                subcategories: Some(subcategories.clone()),
                description: None,
                batch: format!("mcq_batch_{}", i),
            });
        }
    }
    if has_coding {
        batches.push(BatchDescriptor {
            kind: "Coding".to_string(),
            subcategories: None,
            description: Some("Programming questions".to_string()),
            batch: "programming_batch_1".to_string(),
        });
    }
    batches
}
