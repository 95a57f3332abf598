// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        student::BatchCreateRequest,
        violation::{ResolveAction, ResolveRequest, ViolationStatus},
    },
    state::AppState,
    store,
    utils::jwt::sign_jwt,
};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Authenticates an admin against the shared-secret credentials from the
/// environment and issues a bearer token.
pub async fn login(
    State(config): State<Config>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.username.trim() != config.admin_username
        || payload.password.trim() != config.admin_password
    {
        tracing::warn!(username = %payload.username, "admin login failed");
        return Err(AppError::Unauthorized(
            "Invalid admin credentials".to_string(),
        ));
    }

    let token = sign_jwt(&config.admin_username, &config.jwt_secret, config.jwt_expiration)?;

    tracing::info!(username = %config.admin_username, "admin logged in");

    Ok(Json(serde_json::json!({
        "token": token,
        "type": "Bearer"
    })))
}

/// Lists the violation ledger, newest first.
pub async fn list_violations(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let violations = store::violations::list_all(&pool).await?;
    Ok(Json(violations))
}

/// Lists all student sessions, newest first.
pub async fn list_students(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let students = store::sessions::list_all(&pool).await?;
    Ok(Json(students))
}

/// Lists results ordered by score desc, duration asc.
pub async fn list_results(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let results = store::results::list_all(&pool).await?;
    Ok(Json(results))
}

/// Bulk roster upload.
pub async fn batch_create_students(
    State(pool): State<SqlitePool>,
    Json(payload): Json<BatchCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.students.is_empty() {
        return Err(AppError::BadRequest("No students in upload".to_string()));
    }
    for student in &payload.students {
        if let Err(validation_errors) = student.validate() {
            return Err(AppError::BadRequest(validation_errors.to_string()));
        }
    }

    store::sessions::insert_batch(&pool, &payload.students).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Students uploaded successfully" })),
    ))
}

pub async fn delete_student(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = store::sessions::delete_by_id(&pool, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a result and cascades the owning session back to `pending`
/// with zeroed score/duration/violations, enabling a retake.
pub async fn delete_result(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = store::results::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Result not found".to_string()))?;

    store::sessions::reset_for_retake(&pool, &result.student_id).await?;
    store::results::delete_by_id(&pool, id).await?;

    tracing::info!(student_id = %result.student_id, result_id = id, "result deleted, session reset");

    Ok(Json(serde_json::json!({
        "message": "Result deleted and student status reset"
    })))
}

/// Deletes a ledger entry and cascades the owning session to `active`
/// with a zeroed tally.
pub async fn delete_violation(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let violation = store::violations::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Violation not found".to_string()))?;

    store::sessions::clear_violations(&pool, &violation.student_id).await?;
    store::sessions::set_status(
        &pool,
        &violation.student_id,
        crate::models::student::SessionStatus::Active,
    )
    .await?;
    store::violations::delete_by_id(&pool, id).await?;

    Ok(Json(serde_json::json!({
        "message": "Violation deleted and student status reset"
    })))
}

/// Admin Decision Handler: resolves exactly one pending violation.
///
/// The Session Store update commits before the targeted event is emitted,
/// so a client re-reading its status on reconnect sees consistent state.
pub async fn resolve_violation(
    State(state): State<AppState>,
    Json(payload): Json<ResolveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let violation = store::violations::find_by_id(&state.pool, payload.violation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Violation not found".to_string()))?;

    let status = match payload.action {
        ResolveAction::Approve => ViolationStatus::Approved,
        ResolveAction::Reject => ViolationStatus::Rejected,
    };
    store::violations::set_status(&state.pool, payload.violation_id, status).await?;

    if payload.action == ResolveAction::Approve {
        store::sessions::clear_violations(&state.pool, &violation.student_id).await?;
    }

    let reached = state
        .channel
        .resolve_to(&violation.student_id, payload.action);

    tracing::info!(
        student_id = %violation.student_id,
        violation_id = payload.violation_id,
        action = ?payload.action,
        reached,
        "violation resolved"
    );

    Ok(Json(serde_json::json!({ "message": "Violation updated" })))
}
