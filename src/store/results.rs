// src/store/results.rs

use sqlx::{SqlitePool, types::Json};

use crate::{
    error::AppError,
    models::result::{AnswerRecord, QuizResult},
};

pub async fn insert(
    pool: &SqlitePool,
    student_id: &str,
    quiz_id: i64,
    score: i64,
    total_questions: i64,
    duration: i64,
    answers: &[AnswerRecord],
) -> Result<QuizResult, AppError> {
    let record = sqlx::query_as::<_, QuizResult>(
        r#"
        INSERT INTO results (student_id, quiz_id, score, total_questions, duration, answers)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(student_id)
    .bind(quiz_id)
    .bind(score)
    .bind(total_questions)
    .bind(duration)
    .bind(Json(answers))
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// One-attempt policy probe.
pub async fn exists_for_student(pool: &SqlitePool, student_id: &str) -> Result<bool, AppError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM results WHERE student_id = ?")
            .bind(student_id)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<QuizResult>, AppError> {
    let record = sqlx::query_as::<_, QuizResult>("SELECT * FROM results WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Leaderboard ordering: best score first, ties broken by faster finish.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<QuizResult>, AppError> {
    let records = sqlx::query_as::<_, QuizResult>(
        "SELECT * FROM results ORDER BY score DESC, duration ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}

pub async fn delete_by_id(pool: &SqlitePool, id: i64) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM results WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
