// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// One answered question inside a submission, in answer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: i64,

    /// Empty string when the timer expired with no selection.
    pub selected_option: String,

    pub is_correct: bool,
}

/// Represents the 'results' table in the database.
/// At most one row per student session (one-attempt policy).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: i64,
    pub student_id: String,
    pub quiz_id: i64,
    pub score: i64,
    pub total_questions: i64,
    pub duration: i64,
    pub answers: Json<Vec<AnswerRecord>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for quiz submission.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, max = 64))]
    pub student_id: String,
    #[validate(range(min = 0))]
    pub score: i64,
    #[validate(range(min = 0))]
    pub duration: i64,
    pub answers: Vec<AnswerRecord>,
}
