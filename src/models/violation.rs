// src/models/violation.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Resolution state of a ledger entry. Terminal once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ViolationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Represents the 'violations' table in the database.
/// Append-only ledger of reported violation events.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub id: i64,

    /// External identifier of the owning student session.
    pub student_id: String,

    /// Denormalized for admin display.
    pub student_name: String,

    /// Free-form category label, e.g. "Tab Switch / Window Blur".
    pub kind: String,

    /// The student's violation tally at time of report (server-derived).
    pub count: i64,

    pub status: ViolationStatus,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Admin decision on a pending violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveAction {
    Approve,
    Reject,
}

/// DTO for the admin resolution endpoint.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub violation_id: i64,
    pub action: ResolveAction,
}
