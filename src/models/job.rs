use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Success,
    Failed,
}

/// Fire-and-forget export job record. Polling by id is the only interface;
/// there is no cancellation and no automatic retry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExportJob {
    pub id: Uuid,
    pub user_id: i64,
    pub status: JobStatus,
    pub result_path: Option<String>,
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
