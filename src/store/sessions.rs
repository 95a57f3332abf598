// src/store/sessions.rs
//
// Session Store: single source of truth for per-student session state.
// Every mutation here is a single-statement atomic update, so concurrent
// reports for the same student serialize at the database even if a client
// bypasses its local lock.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::student::{NewStudent, SessionStatus, StudentSession},
};

/// Violation tally at which a session escalates from `active` to `blocked`.
pub const BLOCK_THRESHOLD: i64 = 2;

pub async fn find_by_student_id(
    pool: &SqlitePool,
    student_id: &str,
) -> Result<Option<StudentSession>, AppError> {
    let session = sqlx::query_as::<_, StudentSession>(
        "SELECT * FROM students WHERE student_id = ?",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Login lookup: both the external identifier and the phone must match.
pub async fn find_by_credentials(
    pool: &SqlitePool,
    student_id: &str,
    phone: &str,
) -> Result<Option<StudentSession>, AppError> {
    let session = sqlx::query_as::<_, StudentSession>(
        "SELECT * FROM students WHERE student_id = ? AND phone = ?",
    )
    .bind(student_id)
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

pub async fn set_status(
    pool: &SqlitePool,
    student_id: &str,
    status: SessionStatus,
) -> Result<(), AppError> {
    sqlx::query("UPDATE students SET status = ? WHERE student_id = ?")
        .bind(status)
        .bind(student_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Atomic increment-and-fetch of the violation tally. Stamps
/// `last_violation_at` and escalates an active session to `blocked` once
/// the tally reaches the threshold. Returns the new tally.
pub async fn record_violation(
    pool: &SqlitePool,
    student_id: &str,
    at: DateTime<Utc>,
) -> Result<i64, AppError> {
    let new_count = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE students
        SET violation_count = violation_count + 1,
            last_violation_at = ?,
            status = CASE
                WHEN violation_count + 1 >= ? AND status = 'active' THEN 'blocked'
                ELSE status
            END
        WHERE student_id = ?
        RETURNING violation_count
        "#,
    )
    .bind(at)
    .bind(BLOCK_THRESHOLD)
    .bind(student_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Student '{}' not found", student_id)))?;

    Ok(new_count)
}

/// Zeroes the tally and clears the last-violation stamp. A blocked session
/// returns to `active`; other statuses are left untouched.
pub async fn clear_violations(pool: &SqlitePool, student_id: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE students
        SET violation_count = 0,
            last_violation_at = NULL,
            status = CASE WHEN status = 'blocked' THEN 'active' ELSE status END
        WHERE student_id = ?
        "#,
    )
    .bind(student_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Finalizes a session with its score and elapsed duration.
pub async fn complete(
    pool: &SqlitePool,
    student_id: &str,
    score: i64,
    duration: i64,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE students SET status = 'completed', score = ?, duration = ? WHERE student_id = ?",
    )
    .bind(score)
    .bind(duration)
    .bind(student_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Cascade reset after an admin deletes a result: back to `pending` with
/// zeroed score, duration and violations, enabling a retake.
pub async fn reset_for_retake(pool: &SqlitePool, student_id: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE students
        SET status = 'pending',
            score = 0,
            duration = 0,
            violation_count = 0,
            last_violation_at = NULL
        WHERE student_id = ?
        "#,
    )
    .bind(student_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<StudentSession>, AppError> {
    let sessions = sqlx::query_as::<_, StudentSession>(
        "SELECT * FROM students ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(sessions)
}

/// Bulk insert for roster uploads. Fails with `Conflict` when any external
/// identifier already exists.
pub async fn insert_batch(pool: &SqlitePool, students: &[NewStudent]) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    for s in students {
        sqlx::query(
            "INSERT INTO students (student_id, name, phone, email, branch) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&s.student_id)
        .bind(&s.name)
        .bind(&s.phone)
        .bind(&s.email)
        .bind(&s.branch)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                AppError::Conflict(format!("Student '{}' already exists", s.student_id))
            } else {
                AppError::from(e)
            }
        })?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn delete_by_id(pool: &SqlitePool, id: i64) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
