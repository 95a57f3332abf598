// src/handlers/quiz.rs

use axum::{Json, extract::State, response::IntoResponse};
use rand::seq::SliceRandom;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{result::SubmitQuizRequest, student::SessionStatus},
    store,
};

/// Returns the single active question set with a fresh uniformly shuffled
/// question order (Fisher-Yates) per call. Option order within each
/// question is left untouched.
pub async fn active_quiz(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let mut quiz = store::quizzes::find_active(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No active quiz".to_string()))?;

    quiz.questions.0.shuffle(&mut rand::rng());

    Ok(Json(quiz))
}

/// Finalizes a session: creates the result record and marks the session
/// `completed` with its final score and duration.
///
/// The one-attempt invariant is re-validated here, not just at login, so
/// two submissions racing for the same session cannot both land.
pub async fn submit(
    State(pool): State<SqlitePool>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let session = store::sessions::find_by_student_id(&pool, &payload.student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    if store::results::exists_for_student(&pool, &session.student_id).await? {
        store::sessions::set_status(&pool, &session.student_id, SessionStatus::Completed).await?;
        return Err(AppError::AlreadyCompleted(
            "A result already exists for this session.".to_string(),
        ));
    }

    let quiz = store::quizzes::find_active(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No active quiz".to_string()))?;

    store::results::insert(
        &pool,
        &session.student_id,
        quiz.id,
        payload.score,
        quiz.questions.0.len() as i64,
        payload.duration,
        &payload.answers,
    )
    .await?;

    store::sessions::complete(&pool, &session.student_id, payload.score, payload.duration)
        .await?;

    tracing::info!(
        student_id = %session.student_id,
        score = payload.score,
        duration = payload.duration,
        "quiz submitted"
    );

    Ok(Json(serde_json::json!({ "message": "Quiz submitted successfully" })))
}
