// src/store/violations.rs
//
// Violation Ledger: append-only log of reported violation events. Entries
// are never deleted automatically; deletion is an explicit admin action
// handled in the admin layer together with its cascade reset.

use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::violation::{ViolationRecord, ViolationStatus},
};

pub async fn insert(
    pool: &SqlitePool,
    student_id: &str,
    student_name: &str,
    kind: &str,
    count: i64,
) -> Result<ViolationRecord, AppError> {
    let record = sqlx::query_as::<_, ViolationRecord>(
        r#"
        INSERT INTO violations (student_id, student_name, kind, count)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(student_id)
    .bind(student_name)
    .bind(kind)
    .bind(count)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

pub async fn find_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<ViolationRecord>, AppError> {
    let record = sqlx::query_as::<_, ViolationRecord>("SELECT * FROM violations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Marks a record resolved. Terminal: there is no path back to `pending`.
pub async fn set_status(
    pool: &SqlitePool,
    id: i64,
    status: ViolationStatus,
) -> Result<(), AppError> {
    sqlx::query("UPDATE violations SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ViolationRecord>, AppError> {
    let records = sqlx::query_as::<_, ViolationRecord>(
        "SELECT * FROM violations ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}

pub async fn delete_by_id(pool: &SqlitePool, id: i64) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM violations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
