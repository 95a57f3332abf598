// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// A single multiple-choice question inside a quiz set.
/// The answer key ships with the set; grading happens on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

/// Represents the 'quizzes' table in the database.
/// Questions are stored as a JSON array in a single column.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizSet {
    pub id: i64,
    pub title: String,
    pub questions: Json<Vec<QuizQuestion>>,

    /// Per-question countdown in seconds.
    pub duration_per_question: i64,

    pub is_active: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
