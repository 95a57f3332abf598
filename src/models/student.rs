// src/models/student.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Lifecycle of a student session.
///
/// Transitions: pending -> active -> completed, active -> blocked on
/// violation escalation, blocked -> active on admin approval. A session
/// with a stored result is permanently `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Active,
    Completed,
    Blocked,
}

/// Represents the 'students' table in the database.
/// Authoritative per-student session record (Session Store).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StudentSession {
    pub id: i64,

    /// Stable external student identifier (unique). Also the channel
    /// group key for targeted real-time delivery.
    pub student_id: String,

    pub name: String,

    /// Second login credential, checked together with `student_id`.
    pub phone: String,

    pub email: Option<String>,
    pub branch: Option<String>,

    pub status: SessionStatus,

    /// Authoritative violation tally, derived from the ledger.
    pub violation_count: i64,
    pub last_violation_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Set only at completion.
    pub score: Option<i64>,
    pub duration: Option<i64>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for student login.
#[derive(Debug, Deserialize, Validate)]
pub struct StudentLoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub student_id: String,
    #[validate(length(min = 4, max = 20))]
    pub phone: String,
}

/// DTO for one row of a bulk student upload.
#[derive(Debug, Deserialize, Validate)]
pub struct NewStudent {
    #[validate(length(min = 1, max = 64))]
    pub student_id: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 4, max = 20))]
    pub phone: String,
    pub email: Option<String>,
    pub branch: Option<String>,
}

/// DTO for the bulk upload endpoint.
#[derive(Debug, Deserialize)]
pub struct BatchCreateRequest {
    pub students: Vec<NewStudent>,
}
