use crate::content::{Content, Question};
use crate::tracker::ScrollData;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown in place of an option when a question was left unanswered
const UNANSWERED: &str = "未回答";

/// Title used when the passage behind a result can no longer be fetched
const TITLE_UNAVAILABLE: &str = "取得できませんでした";

/// The payload that actually travels inside a QR code
///
/// Only the passage id, the picked option indexes and the finish time are
/// carried; everything else is reconstructed from the stored passage when
/// the link is opened. `None` marks a question left unanswered.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MinimalResult {
    pub content_id: String,
    pub answers: Vec<Option<usize>>,
    /// ISO 8601 finish time
    pub timestamp: String,
}

impl MinimalResult {
    /// Builds a payload stamped with the current time
    pub fn new(content_id: &str, answers: Vec<Option<usize>>) -> MinimalResult {
        MinimalResult {
            content_id: content_id.to_string(),
            answers,
            timestamp: now_timestamp(),
        }
    }
}

/// Raised when a shared result token cannot be read back
#[derive(Debug, Error)]
pub enum ResultTokenError {
    #[error("result token is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("result token holds malformed data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Encodes a minimal result as a URL-safe token
///
/// JSON bytes are base64-encoded with `-`/`_` and no padding, so the
/// token can sit in a path segment unescaped.
pub fn encode_minimal(minimal: &MinimalResult) -> Result<String, ResultTokenError> {
    let json = serde_json::to_vec(minimal)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a shared result token
///
/// Padding is tolerated in case a transport re-added it.
pub fn decode_minimal(token: &str) -> Result<MinimalResult, ResultTokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// The shareable link a result token is embedded in
pub fn share_url(origin: &str, token: &str) -> String {
    format!("{origin}/result/{token}")
}

/// Current time in the ISO 8601 form results are stamped with
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Result color for an accuracy: red below 70, blue below 80, green from
/// 80 up, neutral gray when there were no questions
pub fn result_color(accuracy: Option<u32>) -> &'static str {
    match accuracy {
        Some(value) if value < 70 => "#ef4444",
        Some(value) if value < 80 => "#3b82f6",
        Some(_) => "#10b981",
        None => "#6b7280",
    }
}

/// Outcome of looking up the passage a result refers to
///
/// Kept explicit so a missing passage and a failed fetch stay
/// distinguishable all the way into the degraded record.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentLookup {
    Found(Content),
    /// The passage id is unknown
    Missing,
    /// The passage could not be fetched
    Failed,
}

/// Which lookup problem produced a degraded record
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LookupFailure {
    Missing,
    Failed,
}

/// One question's outcome in a displayed result
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: u32,
    pub question: String,
    pub options: Vec<String>,
    pub user_answer_index: Option<usize>,
    pub correct_answer_index: usize,
    /// Picked option text, or 未回答
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// A result rebuilt from a shared token and a passage lookup
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructedResult {
    pub content_id: String,
    pub content_title: String,
    pub accuracy: Option<u32>,
    pub correct_answers: u32,
    pub total_questions: usize,
    pub answers: Vec<Option<usize>>,
    pub question_results: Vec<QuestionResult>,
    pub timestamp: String,
    /// Present only on degraded records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_failure: Option<LookupFailure>,
}

/// Scroll activity stored alongside a result
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrollSummary {
    pub total_scroll_events: usize,
    pub max_scroll_position: f64,
}

/// The full record built when a reader finishes a session
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub content_id: String,
    pub content_title: String,
    pub accuracy: Option<u32>,
    pub correct_answers: u32,
    pub total_questions: usize,
    pub answers: Vec<Option<usize>>,
    pub question_results: Vec<QuestionResult>,
    #[serde(rename = "readingTime")]
    pub reading_time_seconds: u64,
    #[serde(rename = "scrollData")]
    pub scroll_summary: ScrollSummary,
    pub timestamp: String,
    pub color: &'static str,
}

fn question_results(questions: &[Question], answers: &[Option<usize>]) -> Vec<QuestionResult> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let user_answer_index = answers.get(index).copied().flatten();
            QuestionResult {
                question_id: question.id,
                question: question.question.clone(),
                options: question.options.clone(),
                user_answer_index,
                correct_answer_index: question.correct_answer,
                user_answer: user_answer_index
                    .and_then(|picked| question.options.get(picked).cloned())
                    .unwrap_or_else(|| UNANSWERED.to_string()),
                correct_answer: question
                    .options
                    .get(question.correct_answer)
                    .cloned()
                    .unwrap_or_default(),
                is_correct: user_answer_index == Some(question.correct_answer),
                explanation: question
                    .explanation
                    .clone()
                    .filter(|explanation| !explanation.is_empty()),
            }
        })
        .collect()
}

fn count_correct(questions: &[Question], answers: &[Option<usize>]) -> u32 {
    questions
        .iter()
        .enumerate()
        .filter(|(index, question)| {
            answers.get(*index).copied().flatten() == Some(question.correct_answer)
        })
        .count() as u32
}

fn accuracy_percent(correct: u32, total: usize) -> u32 {
    (correct as f64 / total as f64 * 100.0).round() as u32
}

/// Rebuilds a displayable result from a decoded token and its lookup
///
/// With the passage at hand the answers are re-scored against the stored
/// questions. A passage without questions yields an accuracy of `None`
/// and drops the answers. When the lookup failed, the record keeps the
/// answers and timestamp and notes which failure occurred.
pub fn reconstruct_result(minimal: &MinimalResult, lookup: ContentLookup) -> ReconstructedResult {
    match lookup {
        ContentLookup::Found(content) => {
            if content.questions.is_empty() {
                return ReconstructedResult {
                    content_id: minimal.content_id.clone(),
                    content_title: content.title,
                    accuracy: None,
                    correct_answers: 0,
                    total_questions: 0,
                    answers: Vec::new(),
                    question_results: Vec::new(),
                    timestamp: minimal.timestamp.clone(),
                    lookup_failure: None,
                };
            }
            let correct = count_correct(&content.questions, &minimal.answers);
            ReconstructedResult {
                content_id: minimal.content_id.clone(),
                content_title: content.title.clone(),
                accuracy: Some(accuracy_percent(correct, content.questions.len())),
                correct_answers: correct,
                total_questions: content.questions.len(),
                answers: minimal.answers.clone(),
                question_results: question_results(&content.questions, &minimal.answers),
                timestamp: minimal.timestamp.clone(),
                lookup_failure: None,
            }
        }
        ContentLookup::Missing => degraded_result(minimal, LookupFailure::Missing),
        ContentLookup::Failed => degraded_result(minimal, LookupFailure::Failed),
    }
}

fn degraded_result(minimal: &MinimalResult, failure: LookupFailure) -> ReconstructedResult {
    ReconstructedResult {
        content_id: minimal.content_id.clone(),
        content_title: TITLE_UNAVAILABLE.to_string(),
        accuracy: None,
        correct_answers: 0,
        total_questions: 0,
        answers: minimal.answers.clone(),
        question_results: Vec::new(),
        timestamp: minimal.timestamp.clone(),
        lookup_failure: Some(failure),
    }
}

/// Builds the full record when a reader finishes a session
pub fn build_result_record(
    content: &Content,
    answers: Vec<Option<usize>>,
    reading_time_seconds: u64,
    scroll_data: &ScrollData,
) -> ResultRecord {
    let max_scroll_position = scroll_data
        .scroll_pattern
        .iter()
        .map(|sample| sample.scroll_position)
        .fold(0.0, f64::max);
    let scroll_summary = ScrollSummary {
        total_scroll_events: scroll_data.total_scroll_events,
        max_scroll_position,
    };

    if content.questions.is_empty() {
        return ResultRecord {
            content_id: content.id.clone(),
            content_title: content.title.clone(),
            accuracy: None,
            correct_answers: 0,
            total_questions: 0,
            answers: Vec::new(),
            question_results: Vec::new(),
            reading_time_seconds,
            scroll_summary,
            timestamp: now_timestamp(),
            color: result_color(None),
        };
    }

    let correct = count_correct(&content.questions, &answers);
    let accuracy = accuracy_percent(correct, content.questions.len());
    ResultRecord {
        content_id: content.id.clone(),
        content_title: content.title.clone(),
        accuracy: Some(accuracy),
        correct_answers: correct,
        total_questions: content.questions.len(),
        question_results: question_results(&content.questions, &answers),
        answers,
        reading_time_seconds,
        scroll_summary,
        timestamp: now_timestamp(),
        color: result_color(Some(accuracy)),
    }
}
