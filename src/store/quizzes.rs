// src/store/quizzes.rs

use sqlx::SqlitePool;

use crate::{error::AppError, models::quiz::QuizSet};

/// The single currently-active question set, if any.
pub async fn find_active(pool: &SqlitePool) -> Result<Option<QuizSet>, AppError> {
    let quiz = sqlx::query_as::<_, QuizSet>(
        "SELECT * FROM quizzes WHERE is_active = 1 ORDER BY id LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(quiz)
}
