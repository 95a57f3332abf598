// src/handlers/student.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::student::{SessionStatus, StudentLoginRequest},
    store,
};

/// Authenticates a student and opens their session.
///
/// Enforces the strict one-attempt policy: a session with an existing
/// result is forced to `completed` and hard-blocked, every time, no matter
/// how the status field has drifted. A `blocked` session stays blocked so
/// the client lands directly on the lock screen.
pub async fn login(
    State(pool): State<SqlitePool>,
    Json(payload): Json<StudentLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let session = store::sessions::find_by_credentials(&pool, &payload.student_id, &payload.phone)
        .await?
        .ok_or_else(|| AppError::InvalidCredentials("Invalid credentials".to_string()))?;

    if session.status == SessionStatus::Completed
        || store::results::exists_for_student(&pool, &session.student_id).await?
    {
        store::sessions::set_status(&pool, &session.student_id, SessionStatus::Completed).await?;
        return Err(AppError::AlreadyCompleted(
            "You have already completed the quiz. Multiple attempts are not allowed.".to_string(),
        ));
    }

    if session.status != SessionStatus::Blocked {
        store::sessions::set_status(&pool, &session.student_id, SessionStatus::Active).await?;
    }

    // Re-read so the response reflects the committed transition.
    let session = store::sessions::find_by_student_id(&pool, &session.student_id)
        .await?
        .ok_or_else(|| AppError::ServerFault("Session vanished during login".to_string()))?;

    tracing::info!(student_id = %session.student_id, status = ?session.status, "student logged in");

    Ok(Json(serde_json::json!({ "student": session })))
}

/// Current session snapshot, used by the client to sync violation state
/// on quiz start and after reconnects.
pub async fn status(
    State(pool): State<SqlitePool>,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = store::sessions::find_by_student_id(&pool, &student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    Ok(Json(session))
}
